//! Presence tracker: writes online/offline/last-seen through to the store.

use std::sync::Arc;

use duet_core::error::AppError;
use duet_core::result::AppResult;
use duet_core::types::id::UserId;
use duet_database::ChatStore;
use duet_entity::user::PublicUser;

use super::event::{PresenceEvent, PresenceKind};
use crate::metrics::EngineMetrics;

/// Maintains each user's persisted presence state.
///
/// Every transition is a store write; an event is produced only when the
/// write succeeded. Failures are logged here and returned so the caller
/// can skip the broadcast.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    store: Arc<dyn ChatStore>,
    metrics: Arc<EngineMetrics>,
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new(store: Arc<dyn ChatStore>, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Mark a user as online and stamp last-seen.
    pub async fn mark_online(&self, user_id: UserId) -> AppResult<PresenceEvent> {
        self.write(user_id, true, PresenceKind::UserOnline).await
    }

    /// Mark a user as offline and stamp last-seen.
    pub async fn mark_offline(&self, user_id: UserId) -> AppResult<PresenceEvent> {
        self.write(user_id, false, PresenceKind::UserOffline).await
    }

    /// Refresh last-seen. The user stays online.
    pub async fn touch_last_seen(&self, user_id: UserId) -> AppResult<PresenceEvent> {
        self.write(user_id, true, PresenceKind::UserStatusUpdate).await
    }

    /// Users whose persisted presence flag is set.
    pub async fn online_users(&self) -> AppResult<Vec<PublicUser>> {
        self.store.get_online_users().await.inspect_err(|e| {
            self.metrics.record_store_failure();
            tracing::warn!(error = %e, "Failed to list online users");
        })
    }

    async fn write(
        &self,
        user_id: UserId,
        is_online: bool,
        kind: PresenceKind,
    ) -> AppResult<PresenceEvent> {
        match self.store.update_user_online_status(user_id, is_online).await {
            Ok(Some(state)) => {
                tracing::debug!(user_id = %user_id, is_online, ?kind, "Presence updated");
                Ok(PresenceEvent::from_state(kind, state))
            }
            Ok(None) => {
                tracing::warn!(user_id = %user_id, ?kind, "Presence update for unknown user");
                Err(AppError::not_found(format!("User {user_id} not found")))
            }
            Err(e) => {
                self.metrics.record_store_failure();
                tracing::warn!(user_id = %user_id, ?kind, error = %e, "Presence store write failed");
                Err(e)
            }
        }
    }
}
