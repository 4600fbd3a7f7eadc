//! Route definitions for the Duet HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket endpoint lives at
//! `/ws`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(user_routes())
        .merge(chat_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// User directory and profile endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/online", get(handlers::user::online_users))
        .route("/users/me", put(handlers::user::update_profile))
        .route("/users/{id}", get(handlers::user::get_user))
}

/// Conversation endpoints
fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chats", get(handlers::chat::list_chats))
        .route("/messages/{peer_id}", get(handlers::message::conversation))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/realtime", get(handlers::health::realtime_health))
}
