//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use duet_core::types::id::UserId;

use crate::presence::PresenceState;

/// A registered chat user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Pre-hashed password; hashing and verification live outside Duet.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Profile picture URL.
    pub avatar_url: Option<String>,
    /// Last persisted presence flag.
    pub is_online: bool,
    /// Last time the user was seen on a live connection.
    pub last_seen: DateTime<Utc>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Strip private fields for display to other users.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            is_online: self.is_online,
            last_seen: self.last_seen,
        }
    }
}

/// The part of a user that is safe to show to peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// User ID.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Last persisted presence flag.
    pub is_online: bool,
    /// Last seen timestamp.
    pub last_seen: DateTime<Utc>,
}

impl PublicUser {
    /// Presence projection of this user.
    pub fn presence(&self) -> PresenceState {
        PresenceState {
            user_id: self.id,
            is_online: self.is_online,
            last_seen_at: self.last_seen,
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name (optional).
    pub display_name: Option<String>,
}

/// Profile fields a user may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    /// New display name.
    pub display_name: Option<String>,
    /// New avatar URL.
    pub avatar_url: Option<String>,
}
