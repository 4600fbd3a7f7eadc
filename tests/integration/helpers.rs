//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use duet_api::AppState;
use duet_core::config::{AppConfig, StoreProvider};
use duet_core::types::id::UserId;
use duet_database::{ChatStore, MemoryChatStore};
use duet_entity::message::{ChatMessage, MessageType, NewMessage};
use duet_entity::user::CreateUser;
use duet_realtime::RealtimeEngine;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Store shared with the router
    pub store: Arc<MemoryChatStore>,
    /// Real-time engine shared with the router
    pub engine: RealtimeEngine,
}

/// A parsed test response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// Create a new test application on a fresh in-memory store
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with custom settings
    pub fn with_config(mut config: AppConfig) -> Self {
        config.database.provider = StoreProvider::Memory;

        let store = Arc::new(MemoryChatStore::new());
        let engine = RealtimeEngine::new(config.realtime.clone(), store.clone());
        let state = AppState::new(config, store.clone(), engine.clone());

        Self {
            router: duet_api::build_router(state),
            store,
            engine,
        }
    }

    pub async fn create_user(&self, username: &str) -> UserId {
        self.store
            .create_user(CreateUser {
                username: username.to_string(),
                password_hash: String::new(),
                display_name: None,
            })
            .await
            .expect("create user")
            .id
    }

    pub async fn send_message(&self, from: UserId, to: UserId, content: &str) -> ChatMessage {
        self.store
            .create_message(NewMessage {
                sender_id: from,
                receiver_id: to,
                content: content.to_string(),
                message_type: MessageType::Text,
                image_url: None,
            })
            .await
            .expect("create message")
    }

    /// Make a request against the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        caller: Option<UserId>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header("x-user-id", caller.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the router on an ephemeral port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }
}

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn ws_connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket handshake");
    ws
}

pub async fn ws_send(ws: &mut WsClient, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// Next JSON text frame, skipping control frames.
pub async fn ws_recv(ws: &mut WsClient) -> Value {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("read frame");
        if let Message::Text(text) = next {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

/// Assert nothing arrives within a short window.
pub async fn ws_expect_silence(ws: &mut WsClient) {
    let quiet = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await;
    if let Ok(Some(text)) = quiet {
        panic!("expected no frame, got {text}");
    }
}
