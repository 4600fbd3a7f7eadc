//! Health check handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::dto::response::{ApiResponse, HealthResponse, RealtimeHealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let store_reachable = state.store.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if store_reachable { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        store_reachable,
    }))
}

/// GET /api/health/realtime
pub async fn realtime_health(
    State(state): State<AppState>,
) -> Json<ApiResponse<RealtimeHealthResponse>> {
    let status = if state.realtime.is_shutting_down() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(ApiResponse::ok(RealtimeHealthResponse {
        status: status.to_string(),
        stats: state.realtime.stats(),
    }))
}
