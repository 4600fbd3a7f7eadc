//! Durable store contract consumed by the real-time core.

use async_trait::async_trait;

use duet_core::result::AppResult;
use duet_core::types::id::UserId;
use duet_entity::message::{ChatListEntry, ChatMessage, NewMessage};
use duet_entity::presence::PresenceState;
use duet_entity::user::{CreateUser, PublicUser, UpdateProfile, User};

/// CRUD-style contract over users and messages.
///
/// The store is the source of truth for message content and last-known
/// presence. Every method may fail with a `Database` or
/// `ServiceUnavailable` error; callers in the real-time core log those
/// and carry on.
#[async_trait]
pub trait ChatStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by username (case-insensitive).
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by id.
    async fn get_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Create a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, input: CreateUser) -> AppResult<User>;

    /// Set the online flag and stamp `last_seen` with the current time.
    ///
    /// Returns `None` when no such user exists. Repeating the call with
    /// the same flag is idempotent apart from the refreshed timestamp.
    async fn update_user_online_status(
        &self,
        id: UserId,
        is_online: bool,
    ) -> AppResult<Option<PresenceState>>;

    /// Apply a profile update. Returns `None` when no such user exists.
    async fn update_user_profile(
        &self,
        id: UserId,
        update: UpdateProfile,
    ) -> AppResult<Option<User>>;

    /// All users whose persisted presence flag is set.
    async fn get_online_users(&self) -> AppResult<Vec<PublicUser>>;

    /// Persist a message. The store assigns `id` and `created_at` and
    /// sets `is_read = false`. Fails with `NotFound` if either participant
    /// does not exist.
    async fn create_message(&self, message: NewMessage) -> AppResult<ChatMessage>;

    /// The most recent `limit` messages exchanged between `a` and `b`, in
    /// ascending creation order. Argument order does not matter.
    async fn get_messages_between_users(
        &self,
        a: UserId,
        b: UserId,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>>;

    /// Mark every unread `sender_id → receiver_id` message as read.
    /// Returns the number of messages that changed.
    async fn mark_messages_as_read(&self, sender_id: UserId, receiver_id: UserId)
    -> AppResult<u64>;

    /// Every other user with the last message exchanged and the unread
    /// count, most recent conversation first.
    async fn get_user_chat_list(&self, user_id: UserId) -> AppResult<Vec<ChatListEntry>>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
