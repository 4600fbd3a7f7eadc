//! Presence state value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use duet_core::types::id::UserId;

/// Online/offline/last-seen state of a user, persisted on the user row.
///
/// Created implicitly on the first presence write and only ever
/// transitioned afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceState {
    /// User ID.
    pub user_id: UserId,
    /// Whether the user is reachable over a live connection.
    pub is_online: bool,
    /// Last activity timestamp.
    pub last_seen_at: DateTime<Utc>,
}
