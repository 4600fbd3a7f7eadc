//! Chat message domain entities.

pub mod kind;
pub mod model;

pub use kind::MessageType;
pub use model::{ChatListEntry, ChatMessage, NewMessage};

/// Maximum message content length, counted in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Default number of messages returned by a conversation fetch.
pub const DEFAULT_CONVERSATION_LIMIT: i64 = 50;
