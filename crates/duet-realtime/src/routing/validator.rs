//! Chat payload validation rules.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use duet_core::types::id::UserId;
use duet_entity::message::{MAX_CONTENT_CHARS, MessageType, NewMessage};

/// The `data` object of an inbound `chat_message` frame, as sent.
///
/// Every field is optional and untyped so that validation can report
/// each violated field instead of failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatPayload {
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub content: Option<String>,
    pub message_type: Option<String>,
    pub image_url: Option<String>,
}

/// One rule a payload broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Wire name of the field.
    pub field: &'static str,
    /// What was wrong with it.
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// A chat payload failed validation. Nothing was persisted or delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid chat message ({})", summarize(.fields))]
pub struct ValidationError {
    fields: Vec<FieldViolation>,
}

fn summarize(fields: &[FieldViolation]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Every violated rule, in field order.
    pub fn fields(&self) -> &[FieldViolation] {
        &self.fields
    }

    /// Whether `field` is among the violations.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|v| v.field == field)
    }

    /// A single violation found outside payload validation.
    pub(crate) fn single(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldViolation {
                field,
                reason: reason.into(),
            }],
        }
    }
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            reason: reason.into(),
        });
    }
}

/// Validate a payload sent by `authenticated` and build the message to
/// persist.
///
/// An omitted `senderId` is taken from the authenticated identity. An
/// omitted `messageType` means `text`. Empty strings count as omitted for
/// `imageUrl`.
pub fn validate(payload: &ChatPayload, authenticated: UserId) -> Result<NewMessage, ValidationError> {
    let mut violations = Violations::default();

    let sender_id = match payload.sender_id.as_deref() {
        None => Some(authenticated),
        Some(raw) => match raw.parse::<UserId>() {
            Ok(id) if id == authenticated => Some(id),
            Ok(_) => {
                violations.push("senderId", "does not match the authenticated user");
                None
            }
            Err(_) => {
                violations.push("senderId", "must be a valid UUID");
                None
            }
        },
    };

    let receiver_id = match payload.receiver_id.as_deref() {
        None => {
            violations.push("receiverId", "is required");
            None
        }
        Some(raw) => match raw.parse::<UserId>() {
            Ok(id) => Some(id),
            Err(_) => {
                violations.push("receiverId", "must be a valid UUID");
                None
            }
        },
    };

    let content = payload.content.clone().unwrap_or_default();
    if content.trim().is_empty() {
        violations.push("content", "must not be empty");
    } else if content.chars().count() > MAX_CONTENT_CHARS {
        violations.push(
            "content",
            format!("must be at most {MAX_CONTENT_CHARS} characters"),
        );
    }

    let message_type = match payload.message_type.as_deref() {
        None => Some(MessageType::Text),
        Some(raw) => match raw.parse::<MessageType>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                violations.push("messageType", format!("'{raw}' is not one of: text, image"));
                None
            }
        },
    };

    let image_url = payload
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    match (message_type, image_url.is_some()) {
        (Some(kind), false) if kind.requires_image_url() => {
            violations.push("imageUrl", "is required for image messages");
        }
        (Some(kind), true) if !kind.requires_image_url() => {
            violations.push("imageUrl", "is only allowed for image messages");
        }
        _ => {}
    }

    match (sender_id, receiver_id, message_type) {
        (Some(sender_id), Some(receiver_id), Some(message_type)) if violations.0.is_empty() => {
            Ok(NewMessage {
                sender_id,
                receiver_id,
                content,
                message_type,
                image_url,
            })
        }
        _ => Err(ValidationError {
            fields: violations.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(receiver: UserId, content: &str) -> ChatPayload {
        ChatPayload {
            receiver_id: Some(receiver.to_string()),
            content: Some(content.to_string()),
            message_type: Some("text".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_text_fills_sender() {
        let me = UserId::new();
        let peer = UserId::new();
        let msg = validate(&text(peer, "hello"), me).unwrap();
        assert_eq!(msg.sender_id, me);
        assert_eq!(msg.receiver_id, peer);
        assert_eq!(msg.message_type, MessageType::Text);
        assert_eq!(msg.image_url, None);
    }

    #[test]
    fn test_content_boundaries() {
        let me = UserId::new();
        let peer = UserId::new();

        let err = validate(&text(peer, ""), me).unwrap_err();
        assert!(err.has_field("content"));

        let exact = "é".repeat(1000);
        assert!(validate(&text(peer, &exact), me).is_ok());

        let over = "a".repeat(1001);
        let err = validate(&text(peer, &over), me).unwrap_err();
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, "content");
    }

    #[test]
    fn test_whitespace_only_content_is_empty() {
        let err = validate(&text(UserId::new(), "  \n "), UserId::new()).unwrap_err();
        assert!(err.has_field("content"));
    }

    #[test]
    fn test_mismatched_sender_rejected() {
        let me = UserId::new();
        let mut payload = text(UserId::new(), "hi");
        payload.sender_id = Some(UserId::new().to_string());
        let err = validate(&payload, me).unwrap_err();
        assert!(err.has_field("senderId"));

        payload.sender_id = Some(me.to_string());
        assert!(validate(&payload, me).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let payload = ChatPayload {
            sender_id: Some("x".to_string()),
            receiver_id: None,
            content: None,
            message_type: Some("video".to_string()),
            image_url: None,
        };
        let err = validate(&payload, UserId::new()).unwrap_err();
        let fields: Vec<_> = err.fields().iter().map(|v| v.field).collect();
        assert_eq!(fields, ["senderId", "receiverId", "content", "messageType"]);
    }

    #[test]
    fn test_image_url_iff_image() {
        let me = UserId::new();
        let peer = UserId::new();

        let mut image = text(peer, "caption");
        image.message_type = Some("image".to_string());
        assert!(validate(&image, me).unwrap_err().has_field("imageUrl"));

        image.image_url = Some("   ".to_string());
        assert!(validate(&image, me).unwrap_err().has_field("imageUrl"));

        image.image_url = Some("https://cdn.example/cat.png".to_string());
        let msg = validate(&image, me).unwrap();
        assert_eq!(msg.image_url.as_deref(), Some("https://cdn.example/cat.png"));

        let mut txt = text(peer, "hi");
        txt.image_url = Some("https://cdn.example/cat.png".to_string());
        assert!(validate(&txt, me).unwrap_err().has_field("imageUrl"));
    }

    #[test]
    fn test_missing_message_type_defaults_to_text() {
        let mut payload = text(UserId::new(), "hi");
        payload.message_type = None;
        let msg = validate(&payload, UserId::new()).unwrap();
        assert_eq!(msg.message_type, MessageType::Text);
    }
}
