//! Conversation list handler.

use axum::Json;
use axum::extract::State;

use duet_entity::message::ChatListEntry;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// GET /api/chats
pub async fn list_chats(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<ApiResponse<Vec<ChatListEntry>>>, ApiError> {
    let chats = state.store.get_user_chat_list(caller.id()).await?;
    Ok(Json(ApiResponse::ok(chats)))
}
