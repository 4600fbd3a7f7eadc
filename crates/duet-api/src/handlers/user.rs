//! User directory and profile handlers.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use duet_core::error::AppError;
use duet_core::types::id::UserId;
use duet_entity::user::PublicUser;

use crate::dto::request::UpdateProfileRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// GET /api/users/online
pub async fn online_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let users = state.realtime.presence.online_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
    Ok(Json(ApiResponse::ok(user.to_public())))
}

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    req.validate()?;

    let user = state
        .store
        .update_user_profile(caller.id(), req.into())
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", caller.id())))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(ApiResponse::ok(user.to_public())))
}
