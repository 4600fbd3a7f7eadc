//! Chat message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use duet_core::types::id::{MessageId, UserId};

use super::kind::MessageType;
use crate::user::PublicUser;

/// A persisted one-on-one chat message.
///
/// Immutable once created except for `is_read`, which only ever moves
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned identifier.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Recipient.
    pub receiver_id: UserId,
    /// Text body or image caption.
    pub content: String,
    /// Content kind.
    pub message_type: MessageType,
    /// Image location, present iff `message_type` is `image`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    /// Whether the receiver has fetched this message.
    pub is_read: bool,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A validated message ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Author.
    pub sender_id: UserId,
    /// Recipient.
    pub receiver_id: UserId,
    /// Text body or caption.
    pub content: String,
    /// Content kind.
    pub message_type: MessageType,
    /// Image location.
    pub image_url: Option<String>,
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListEntry {
    /// The conversation peer.
    pub user: PublicUser,
    /// Most recent message exchanged with the peer.
    pub last_message: Option<ChatMessage>,
    /// Messages from the peer the caller has not read yet.
    pub unread_count: i64,
}
