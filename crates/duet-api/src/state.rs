//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use duet_core::config::AppConfig;
use duet_database::ChatStore;
use duet_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Durable store
    pub store: Arc<dyn ChatStore>,
    /// WebSocket realtime engine
    pub realtime: RealtimeEngine,
    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ChatStore>, realtime: RealtimeEngine) -> Self {
        Self {
            config: Arc::new(config),
            store,
            realtime,
            started_at: Utc::now(),
        }
    }
}
