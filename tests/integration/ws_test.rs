//! Integration tests for WebSocket connection and messaging.

mod helpers;

use serde_json::json;

use duet_core::config::AppConfig;
use duet_database::ChatStore;
use helpers::{ws_connect, ws_expect_silence, ws_recv, ws_send};

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/ws", None, None).await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
}

#[tokio::test]
async fn test_two_clients_chat_over_websocket() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let addr = app.spawn().await;

    let mut a = ws_connect(addr).await;
    ws_send(&mut a, json!({"type": "auth", "userId": alice})).await;
    let frame = ws_recv(&mut a).await;
    assert_eq!(frame, json!({"type": "user_online", "userId": alice}));

    let mut b = ws_connect(addr).await;
    ws_send(&mut b, json!({"type": "auth", "userId": bob})).await;
    assert_eq!(
        ws_recv(&mut a).await,
        json!({"type": "user_online", "userId": bob})
    );
    assert_eq!(
        ws_recv(&mut b).await,
        json!({"type": "user_online", "userId": bob})
    );

    ws_send(
        &mut a,
        json!({
            "type": "chat_message",
            "data": {"senderId": alice, "receiverId": bob, "content": "hello", "messageType": "text"}
        }),
    )
    .await;

    let received = ws_recv(&mut b).await;
    assert_eq!(received["type"], "new_message");
    let confirmed = ws_recv(&mut a).await;
    assert_eq!(confirmed["type"], "message_sent");
    assert_eq!(received["message"], confirmed["message"]);
    assert_eq!(received["message"]["content"], "hello");
    assert_eq!(received["message"]["isRead"], false);

    ws_send(
        &mut b,
        json!({"type": "typing", "senderId": bob, "receiverId": alice, "isTyping": true}),
    )
    .await;
    assert_eq!(
        ws_recv(&mut a).await,
        json!({"type": "typing", "senderId": bob, "isTyping": true})
    );

    b.close(None).await.expect("close");
    assert_eq!(
        ws_recv(&mut a).await,
        json!({"type": "user_offline", "userId": bob})
    );
    let stored = app.store.get_user(bob).await.unwrap().unwrap();
    assert!(!stored.is_online);
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_connection() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice").await;
    let addr = app.spawn().await;

    let mut a = ws_connect(addr).await;
    ws_send(&mut a, json!({"type": "subscribe", "channel": "x"})).await;
    ws_send(&mut a, json!({"type": "chat_message", "data": {"content": "early"}})).await;
    ws_expect_silence(&mut a).await;

    ws_send(&mut a, json!({"type": "auth", "userId": alice})).await;
    assert_eq!(
        ws_recv(&mut a).await,
        json!({"type": "user_online", "userId": alice})
    );
    assert_eq!(app.store.message_count().await, 0);
}

#[tokio::test]
async fn test_second_login_supersedes_first_socket() {
    let app = helpers::TestApp::new();
    let alice = app.create_user("alice").await;
    let addr = app.spawn().await;

    let mut first = ws_connect(addr).await;
    ws_send(&mut first, json!({"type": "auth", "userId": alice})).await;
    ws_recv(&mut first).await;

    let mut second = ws_connect(addr).await;
    ws_send(&mut second, json!({"type": "auth", "userId": alice})).await;
    assert_eq!(
        ws_recv(&mut second).await,
        json!({"type": "user_online", "userId": alice})
    );

    ws_expect_silence(&mut second).await;
    assert_eq!(app.engine.registry.len(), 1);
    assert!(app.store.get_user(alice).await.unwrap().unwrap().is_online);
}

#[tokio::test]
async fn test_silent_client_times_out_and_goes_offline() {
    let mut config = AppConfig::default();
    config.realtime.ping_interval_seconds = 1;
    config.realtime.ping_timeout_seconds = 2;
    let app = helpers::TestApp::with_config(config);
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let addr = app.spawn().await;

    let mut b = ws_connect(addr).await;
    ws_send(&mut b, json!({"type": "auth", "userId": bob})).await;
    ws_recv(&mut b).await;

    // Alice authenticates and then never reads, so her pongs never go out.
    let mut a = ws_connect(addr).await;
    ws_send(&mut a, json!({"type": "auth", "userId": alice})).await;
    assert_eq!(
        ws_recv(&mut b).await,
        json!({"type": "user_online", "userId": alice})
    );

    assert_eq!(
        ws_recv(&mut b).await,
        json!({"type": "user_offline", "userId": alice})
    );
    assert!(!app.store.get_user(alice).await.unwrap().unwrap().is_online);
    assert!(!app.engine.registry.is_bound(alice));
    assert!(app.engine.registry.is_bound(bob));

    drop(a);
}
