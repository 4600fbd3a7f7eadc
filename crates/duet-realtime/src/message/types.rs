//! Inbound and outbound WebSocket event definitions.
//!
//! Every frame is a JSON object discriminated by its `type` field. Field
//! names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use duet_core::types::id::UserId;
use duet_entity::message::ChatMessage;

use crate::routing::validator::ChatPayload;

/// Events sent by the client to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    /// Identify the connection. Must be the first event.
    Auth {
        /// Identity to bind this connection to.
        user_id: UserId,
    },
    /// Send a chat message.
    ChatMessage {
        /// Raw payload; validated by the router.
        data: ChatPayload,
    },
    /// Typing indicator.
    Typing {
        /// Who is typing.
        sender_id: UserId,
        /// Who should see the indicator.
        receiver_id: UserId,
        /// Started or stopped typing.
        is_typing: bool,
    },
    /// Application-level heartbeat refreshing last-seen.
    UpdateLastSeen {
        /// The heartbeating user.
        user_id: UserId,
    },
}

impl InboundEvent {
    /// Every `type` tag this enum understands.
    pub const KNOWN_TYPES: [&'static str; 4] =
        ["auth", "chat_message", "typing", "update_last_seen"];

    /// The wire tag for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::ChatMessage { .. } => "chat_message",
            Self::Typing { .. } => "typing",
            Self::UpdateLastSeen { .. } => "update_last_seen",
        }
    }
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    /// A message addressed to this client.
    NewMessage {
        /// The persisted message.
        message: ChatMessage,
    },
    /// Confirmation that a message this client sent was persisted.
    MessageSent {
        /// The persisted message.
        message: ChatMessage,
    },
    /// A peer started or stopped typing to this client.
    Typing {
        /// The typing peer.
        sender_id: UserId,
        /// Started or stopped.
        is_typing: bool,
    },
    /// A user came online.
    UserOnline {
        /// The user.
        user_id: UserId,
    },
    /// A user went offline.
    UserOffline {
        /// The user.
        user_id: UserId,
    },
    /// A user's last-seen was refreshed.
    UserStatusUpdate {
        /// The user.
        user_id: UserId,
        /// New last-seen timestamp.
        last_seen: DateTime<Utc>,
        /// Current presence flag.
        is_online: bool,
    },
}

impl OutboundEvent {
    /// The wire tag for this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new_message",
            Self::MessageSent { .. } => "message_sent",
            Self::Typing { .. } => "typing",
            Self::UserOnline { .. } => "user_online",
            Self::UserOffline { .. } => "user_offline",
            Self::UserStatusUpdate { .. } => "user_status_update",
        }
    }
}
