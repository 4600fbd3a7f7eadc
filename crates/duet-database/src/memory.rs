//! Process-local [`ChatStore`] used by tests and `provider = "memory"`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use duet_core::error::AppError;
use duet_core::result::AppResult;
use duet_core::types::id::{MessageId, UserId};
use duet_entity::message::{ChatListEntry, ChatMessage, NewMessage};
use duet_entity::presence::PresenceState;
use duet_entity::user::{CreateUser, PublicUser, UpdateProfile, User};

use crate::store::ChatStore;

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    /// Insertion order is creation order.
    messages: Vec<ChatMessage>,
    last_created_at: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Strictly increasing creation timestamps so ordering never ties.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(ts);
        ts
    }

    fn between(&self, a: UserId, b: UserId) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(move |m| {
            (m.sender_id == a && m.receiver_id == b) || (m.sender_id == b && m.receiver_id == a)
        })
    }
}

/// In-memory store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryChatStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `ServiceUnavailable` until
    /// switched back. Lets tests exercise store-outage paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of persisted messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Memory store is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.check_available()?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        self.check_available()?;
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&input.username))
        {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: input.username,
            password_hash: input.password_hash,
            display_name: input.display_name,
            avatar_url: None,
            is_online: false,
            last_seen: now,
            created_at: now,
        };
        state.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update_user_online_status(
        &self,
        id: UserId,
        is_online: bool,
    ) -> AppResult<Option<PresenceState>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            user.is_online = is_online;
            user.last_seen = Utc::now();
            PresenceState {
                user_id: user.id,
                is_online: user.is_online,
                last_seen_at: user.last_seen,
            }
        }))
    }

    async fn update_user_profile(
        &self,
        id: UserId,
        update: UpdateProfile,
    ) -> AppResult<Option<User>> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&id).map(|user| {
            if let Some(name) = update.display_name {
                user.display_name = Some(name);
            }
            if let Some(url) = update.avatar_url {
                user.avatar_url = Some(url);
            }
            user.clone()
        }))
    }

    async fn get_online_users(&self) -> AppResult<Vec<PublicUser>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut online: Vec<PublicUser> = state
            .users
            .values()
            .filter(|u| u.is_online)
            .map(User::to_public)
            .collect();
        online.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(online)
    }

    async fn create_message(&self, message: NewMessage) -> AppResult<ChatMessage> {
        self.check_available()?;
        let mut state = self.state.write().await;
        for id in [message.sender_id, message.receiver_id] {
            if !state.users.contains_key(&id) {
                return Err(AppError::not_found(format!("User {id} not found")));
            }
        }
        let created_at = state.next_timestamp();
        let persisted = ChatMessage {
            id: MessageId::new(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            message_type: message.message_type,
            image_url: message.image_url,
            is_read: false,
            created_at,
        };
        state.messages.push(persisted.clone());
        Ok(persisted)
    }

    async fn get_messages_between_users(
        &self,
        a: UserId,
        b: UserId,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>> {
        self.check_available()?;
        let state = self.state.read().await;
        let conversation: Vec<ChatMessage> = state.between(a, b).cloned().collect();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let skip = conversation.len().saturating_sub(limit);
        Ok(conversation.into_iter().skip(skip).collect())
    }

    async fn mark_messages_as_read(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> AppResult<u64> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let mut changed = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == receiver_id && !m.is_read)
        {
            message.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn get_user_chat_list(&self, user_id: UserId) -> AppResult<Vec<ChatListEntry>> {
        self.check_available()?;
        let state = self.state.read().await;
        let mut entries: Vec<ChatListEntry> = state
            .users
            .values()
            .filter(|u| u.id != user_id)
            .map(|peer| {
                let last_message = state.between(user_id, peer.id).last().cloned();
                let unread_count = state
                    .messages
                    .iter()
                    .filter(|m| m.sender_id == peer.id && m.receiver_id == user_id && !m.is_read)
                    .count() as i64;
                ChatListEntry {
                    user: peer.to_public(),
                    last_message,
                    unread_count,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            let a_at = a.last_message.as_ref().map(|m| m.created_at);
            let b_at = b.last_message.as_ref().map(|m| m.created_at);
            // Conversations with messages first, newest first; then by username.
            b_at.cmp(&a_at)
                .then_with(|| a.user.username.cmp(&b.user.username))
        });
        Ok(entries)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}
