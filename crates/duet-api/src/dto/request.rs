//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use duet_entity::user::UpdateProfile;

/// Update own profile request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    /// New avatar URL.
    #[validate(url, length(max = 2048))]
    pub avatar_url: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            avatar_url: req.avatar_url,
        }
    }
}

/// Query for `GET /api/messages/{peer_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConversationQuery {
    /// Number of most recent messages to return.
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_validation() {
        let ok = UpdateProfileRequest {
            display_name: Some("Ada".into()),
            avatar_url: Some("https://cdn.example/ada.png".into()),
        };
        assert!(ok.validate().is_ok());

        let blank = UpdateProfileRequest {
            display_name: Some(String::new()),
            avatar_url: None,
        };
        assert!(blank.validate().is_err());

        let bad_url = UpdateProfileRequest {
            display_name: None,
            avatar_url: Some("not a url".into()),
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_limit_range() {
        assert!(ConversationQuery { limit: None }.validate().is_ok());
        assert!(ConversationQuery { limit: Some(200) }.validate().is_ok());
        assert!(ConversationQuery { limit: Some(0) }.validate().is_err());
        assert!(ConversationQuery { limit: Some(201) }.validate().is_err());
    }
}
