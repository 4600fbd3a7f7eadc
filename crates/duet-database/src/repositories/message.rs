//! Message repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use duet_core::error::{AppError, ErrorKind};
use duet_core::result::AppResult;
use duet_core::types::id::{MessageId, UserId};
use duet_entity::message::{ChatListEntry, ChatMessage, MessageType, NewMessage};
use duet_entity::user::PublicUser;

/// Columns selected for [`ChatMessage`] rows.
const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, content, message_type, image_url, is_read, created_at";

/// Repository for message persistence and conversation queries.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a message; id, timestamp, and read flag come from the database.
    pub async fn create(&self, message: &NewMessage) -> AppResult<ChatMessage> {
        sqlx::query_as::<_, ChatMessage>(&format!(
            "INSERT INTO messages (sender_id, receiver_id, content, message_type, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .bind(message.message_type)
        .bind(&message.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::not_found(
                format!(
                    "Message participant not found ({} -> {})",
                    message.sender_id, message.receiver_id
                ),
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create message", e),
        })
    }

    /// Latest `limit` messages between two users, oldest first.
    pub async fn find_between(
        &self,
        a: UserId,
        b: UserId,
        limit: i64,
    ) -> AppResult<Vec<ChatMessage>> {
        sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM ( \
                SELECT * FROM messages \
                WHERE (sender_id = $1 AND receiver_id = $2) \
                   OR (sender_id = $2 AND receiver_id = $1) \
                ORDER BY created_at DESC, seq DESC LIMIT $3 \
             ) recent ORDER BY created_at ASC, seq ASC"
        ))
        .bind(a)
        .bind(b)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load conversation", e))
    }

    /// Flip unread `sender → receiver` messages to read.
    pub async fn mark_read(&self, sender_id: UserId, receiver_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages read", e))?;
        Ok(result.rows_affected())
    }

    /// Every other user with their last exchanged message and unread count.
    pub async fn chat_list(&self, user_id: UserId) -> AppResult<Vec<ChatListEntry>> {
        let rows = sqlx::query_as::<_, ChatListRow>(
            "SELECT u.id, u.username, u.display_name, u.avatar_url, u.is_online, u.last_seen, \
                    m.id AS message_id, m.sender_id, m.receiver_id, m.content, m.message_type, \
                    m.image_url, m.is_read, m.created_at AS message_created_at, \
                    unread.count AS unread_count \
             FROM users u \
             LEFT JOIN LATERAL ( \
                 SELECT * FROM messages \
                 WHERE (sender_id = $1 AND receiver_id = u.id) \
                    OR (sender_id = u.id AND receiver_id = $1) \
                 ORDER BY created_at DESC, seq DESC LIMIT 1 \
             ) m ON TRUE \
             CROSS JOIN LATERAL ( \
                 SELECT COUNT(*) AS count FROM messages \
                 WHERE sender_id = u.id AND receiver_id = $1 AND is_read = FALSE \
             ) unread \
             WHERE u.id <> $1 \
             ORDER BY m.created_at DESC NULLS LAST, u.username ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load chat list", e))?;

        Ok(rows.into_iter().map(ChatListRow::into_entry).collect())
    }
}

/// Flat row produced by the chat-list query.
#[derive(Debug, FromRow)]
struct ChatListRow {
    id: UserId,
    username: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    is_online: bool,
    last_seen: DateTime<Utc>,
    message_id: Option<MessageId>,
    sender_id: Option<UserId>,
    receiver_id: Option<UserId>,
    content: Option<String>,
    message_type: Option<MessageType>,
    image_url: Option<String>,
    is_read: Option<bool>,
    message_created_at: Option<DateTime<Utc>>,
    unread_count: i64,
}

impl ChatListRow {
    fn into_entry(self) -> ChatListEntry {
        let last_message = match (
            self.message_id,
            self.sender_id,
            self.receiver_id,
            self.content,
            self.message_type,
            self.is_read,
            self.message_created_at,
        ) {
            (
                Some(id),
                Some(sender_id),
                Some(receiver_id),
                Some(content),
                Some(message_type),
                Some(is_read),
                Some(created_at),
            ) => Some(ChatMessage {
                id,
                sender_id,
                receiver_id,
                content,
                message_type,
                image_url: self.image_url,
                is_read,
                created_at,
            }),
            _ => None,
        };

        ChatListEntry {
            user: PublicUser {
                id: self.id,
                username: self.username,
                display_name: self.display_name,
                avatar_url: self.avatar_url,
                is_online: self.is_online,
                last_seen: self.last_seen,
            },
            last_message,
            unread_count: self.unread_count,
        }
    }
}
