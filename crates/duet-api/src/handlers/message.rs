//! Conversation history handler.

use axum::Json;
use axum::extract::{Path, Query, State};
use validator::Validate;

use duet_core::error::AppError;
use duet_core::types::id::UserId;
use duet_entity::message::ChatMessage;

use crate::dto::request::ConversationQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// GET /api/messages/{peer_id}?limit=
///
/// Returns the latest messages with the peer in ascending order, then
/// marks the peer's messages to the caller as read.
pub async fn conversation(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(peer_id): Path<UserId>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    query.validate()?;

    if state.store.get_user(peer_id).await?.is_none() {
        return Err(AppError::not_found(format!("User {peer_id} not found")).into());
    }

    let limit = query
        .limit
        .unwrap_or(state.config.realtime.conversation_page_limit);
    let messages = state
        .store
        .get_messages_between_users(caller.id(), peer_id, limit)
        .await?;

    let marked = state
        .store
        .mark_messages_as_read(peer_id, caller.id())
        .await?;
    tracing::debug!(
        user_id = %caller.id(),
        peer_id = %peer_id,
        returned = messages.len(),
        marked,
        "Fetched conversation"
    );

    Ok(Json(ApiResponse::ok(messages)))
}
