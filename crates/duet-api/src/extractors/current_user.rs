//! `CurrentUser` extractor: the caller identity set by the session layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use duet_core::error::AppError;
use duet_core::types::id::UserId;

use crate::error::ApiError;

/// Header carrying the verified caller identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity the request is made on behalf of.
///
/// Credential verification happens upstream; this only reads the
/// identity it forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication(format!("Missing {USER_ID_HEADER} header")))?;

        let user_id = raw
            .trim()
            .parse::<UserId>()
            .map_err(|_| AppError::authentication(format!("Invalid {USER_ID_HEADER} header")))?;

        Ok(Self(user_id))
    }
}
