//! Integration tests for the REST endpoints.

mod helpers;

use http::StatusCode;
use serde_json::json;

use duet_core::types::id::UserId;
use duet_database::ChatStore;

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["storeReachable"], true);
}

#[tokio::test]
async fn test_health_degraded_when_store_down() {
    let app = helpers::TestApp::new();
    app.store.set_unavailable(true);

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "degraded");
}

#[tokio::test]
async fn test_realtime_health_reports_counts() {
    let app = helpers::TestApp::new();
    let (_lifecycle, _rx) = app.engine.open_connection();

    let response = app.request("GET", "/api/health/realtime", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["openConnections"], 1);
    assert_eq!(data["boundIdentities"], 0);
    assert_eq!(data["metrics"]["connectionsOpened"], 1);
}

#[tokio::test]
async fn test_get_user_profile() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;

    let response = app
        .request("GET", &format!("/api/users/{ada}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "ada");
    assert!(response.body["data"].get("passwordHash").is_none());

    let missing = app
        .request("GET", &format!("/api/users/{}", UserId::new()), None, None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_online_users_reflect_store() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;
    app.create_user("bob").await;
    app.store.update_user_online_status(ada, true).await.unwrap();

    let response = app.request("GET", "/api/users/online", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let users = response.body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], ada.to_string());
    assert_eq!(users[0]["isOnline"], true);
}

#[tokio::test]
async fn test_update_profile_requires_caller() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "PUT",
            "/api/users/me",
            None,
            Some(json!({"displayName": "Ada"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile_validates_and_applies() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;

    let bad = app
        .request(
            "PUT",
            "/api/users/me",
            Some(ada),
            Some(json!({"avatarUrl": "not a url"})),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["error"], "VALIDATION_ERROR");

    let ok = app
        .request(
            "PUT",
            "/api/users/me",
            Some(ada),
            Some(json!({"displayName": "Ada L."})),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["data"]["displayName"], "Ada L.");
}

#[tokio::test]
async fn test_conversation_fetch_is_ascending_and_marks_read() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;
    let bob = app.create_user("bob").await;
    app.send_message(bob, ada, "one").await;
    app.send_message(ada, bob, "two").await;
    app.send_message(bob, ada, "three").await;

    let chats = app.request("GET", "/api/chats", Some(ada), None).await;
    assert_eq!(chats.status, StatusCode::OK);
    assert_eq!(chats.body["data"][0]["unreadCount"], 2);

    let response = app
        .request("GET", &format!("/api/messages/{bob}?limit=2"), Some(ada), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let contents: Vec<_> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, ["two", "three"]);

    let chats = app.request("GET", "/api/chats", Some(ada), None).await;
    let entry = &chats.body["data"][0];
    assert_eq!(entry["user"]["id"], bob.to_string());
    assert_eq!(entry["unreadCount"], 0);
    assert_eq!(entry["lastMessage"]["content"], "three");

    // Bob's own unread count is untouched.
    let chats = app.request("GET", "/api/chats", Some(bob), None).await;
    assert_eq!(chats.body["data"][0]["unreadCount"], 1);
}

#[tokio::test]
async fn test_conversation_rejects_bad_limit_and_unknown_peer() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;
    let bob = app.create_user("bob").await;

    let response = app
        .request("GET", &format!("/api/messages/{bob}?limit=0"), Some(ada), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "GET",
            &format!("/api/messages/{}", UserId::new()),
            Some(ada),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_outage_maps_to_503() {
    let app = helpers::TestApp::new();
    let ada = app.create_user("ada").await;
    app.store.set_unavailable(true);

    let response = app.request("GET", "/api/chats", Some(ada), None).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "STORE_UNAVAILABLE");
}
