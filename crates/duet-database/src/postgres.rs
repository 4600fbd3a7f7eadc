//! [`ChatStore`] backed by PostgreSQL.

use async_trait::async_trait;

use duet_core::result::AppResult;
use duet_core::types::id::UserId;
use duet_entity::message::{ChatListEntry, ChatMessage, NewMessage};
use duet_entity::presence::PresenceState;
use duet_entity::user::{CreateUser, PublicUser, UpdateProfile, User};

use crate::connection::DatabasePool;
use crate::repositories::{MessageRepository, UserRepository};
use crate::store::ChatStore;

/// PostgreSQL store composed from the user and message repositories.
#[derive(Debug, Clone)]
pub struct PgChatStore {
    db: DatabasePool,
    users: UserRepository,
    messages: MessageRepository,
}

impl PgChatStore {
    /// Build a store over an established pool.
    pub fn new(db: DatabasePool) -> Self {
        let users = UserRepository::new(db.pool().clone());
        let messages = MessageRepository::new(db.pool().clone());
        Self {
            db,
            users,
            messages,
        }
    }

    /// The user repository.
    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// The message repository.
    pub fn messages(&self) -> &MessageRepository {
        &self.messages
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.find_by_username(username).await
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        self.users.create(&input).await
    }

    async fn update_user_online_status(
        &self,
        id: UserId,
        is_online: bool,
    ) -> AppResult<Option<PresenceState>> {
        self.users.set_online_status(id, is_online).await
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: UpdateProfile,
    ) -> AppResult<Option<User>> {
        self.users.update_profile(id, &update).await
    }

    async fn get_online_users(&self) -> AppResult<Vec<PublicUser>> {
        self.users.find_online().await
    }

    async fn create_message(&self, message: NewMessage) -> AppResult<ChatMessage> {
        self.messages.create(&message).await
    }

    async fn get_messages_between_users(
        &self,
        a: UserId,
        b: UserId,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>> {
        self.messages.find_between(a, b, limit).await
    }

    async fn mark_messages_as_read(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> AppResult<u64> {
        self.messages.mark_read(sender_id, receiver_id).await
    }

    async fn get_user_chat_list(&self, user_id: UserId) -> AppResult<Vec<ChatListEntry>> {
        self.messages.chat_list(user_id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
