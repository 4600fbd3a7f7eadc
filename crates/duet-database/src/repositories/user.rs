//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use duet_core::error::{AppError, ErrorKind};
use duet_core::result::AppResult;
use duet_core::types::id::UserId;
use duet_entity::presence::PresenceState;
use duet_entity::user::{CreateUser, PublicUser, UpdateProfile, User};

/// Columns selected for [`PublicUser`] rows.
const PUBLIC_COLUMNS: &str = "id, username, display_name, avatar_url, is_online, last_seen";

/// Repository for user CRUD and presence columns.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    /// Create a new user.
    pub async fn create(&self, input: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, display_name) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(format!(
                "Username '{}' is already taken",
                input.username
            )),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    /// Set the online flag and refresh `last_seen`.
    pub async fn set_online_status(
        &self,
        id: UserId,
        is_online: bool,
    ) -> AppResult<Option<PresenceState>> {
        let row: Option<(UserId, bool, DateTime<Utc>)> = sqlx::query_as(
            "UPDATE users SET is_online = $2, last_seen = NOW() WHERE id = $1 \
             RETURNING id, is_online, last_seen",
        )
        .bind(id)
        .bind(is_online)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update online status", e)
        })?;

        Ok(row.map(|(user_id, is_online, last_seen_at)| PresenceState {
            user_id,
            is_online,
            last_seen_at,
        }))
    }

    /// Update profile fields, leaving `None` fields untouched.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &UpdateProfile,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET display_name = COALESCE($2, display_name), \
             avatar_url = COALESCE($3, avatar_url) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&update.display_name)
        .bind(&update.avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update profile", e))
    }

    /// List users currently flagged online.
    pub async fn find_online(&self) -> AppResult<Vec<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE is_online ORDER BY username ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list online users", e))
    }
}
