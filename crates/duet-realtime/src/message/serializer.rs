//! JSON framing for WebSocket events.

use thiserror::Error;

use super::types::{InboundEvent, OutboundEvent};

/// Why an inbound frame could not be turned into an [`InboundEvent`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame exceeds the configured size limit.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Frame size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Frame is empty or whitespace.
    #[error("empty frame")]
    Empty,
    /// Not JSON, no `type` tag, or fields do not match the tagged variant.
    #[error("malformed frame: {0}")]
    Malformed(String),
    /// Well-formed JSON with a `type` this server does not handle.
    #[error("unrecognized event type '{0}'")]
    Unrecognized(String),
}

/// Decode one inbound text frame.
pub fn decode_inbound(raw: &str, max_bytes: usize) -> Result<InboundEvent, DecodeError> {
    if raw.len() > max_bytes {
        return Err(DecodeError::TooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }
    if raw.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| DecodeError::Malformed("missing 'type' field".to_string()))?
        .to_string();

    if !InboundEvent::KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(DecodeError::Unrecognized(kind));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Encode one outbound event as a JSON text frame.
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::types::id::UserId;

    const LIMIT: usize = 16 * 1024;

    #[test]
    fn test_decode_auth() {
        let id = UserId::new();
        let raw = format!(r#"{{"type":"auth","userId":"{id}"}}"#);
        match decode_inbound(&raw, LIMIT).unwrap() {
            InboundEvent::Auth { user_id } => assert_eq!(user_id, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_chat_message_keeps_raw_payload() {
        let raw = r#"{"type":"chat_message","data":{"receiverId":"nope","content":"","messageType":"gif"}}"#;
        match decode_inbound(raw, LIMIT).unwrap() {
            InboundEvent::ChatMessage { data } => {
                assert_eq!(data.receiver_id.as_deref(), Some("nope"));
                assert_eq!(data.message_type.as_deref(), Some("gif"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_typing() {
        let (a, b) = (UserId::new(), UserId::new());
        let raw = format!(
            r#"{{"type":"typing","senderId":"{a}","receiverId":"{b}","isTyping":true}}"#
        );
        let event = decode_inbound(&raw, LIMIT).unwrap();
        assert_eq!(event.kind(), "typing");
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let err = decode_inbound(r#"{"type":"join_room","room":"x"}"#, LIMIT).unwrap_err();
        assert!(matches!(err, DecodeError::Unrecognized(t) if t == "join_room"));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode_inbound("not json", LIMIT),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_inbound(r#"{"userId":"x"}"#, LIMIT),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_inbound(r#"{"type":"auth","userId":"not-a-uuid"}"#, LIMIT),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(decode_inbound("  ", LIMIT), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_oversized_frame_rejected_before_parsing() {
        let raw = "x".repeat(33);
        assert!(matches!(
            decode_inbound(&raw, 32),
            Err(DecodeError::TooLarge { size: 33, limit: 32 })
        ));
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let id = UserId::new();
        let json = encode_outbound(&OutboundEvent::UserOnline { user_id: id }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "user_online");
        assert_eq!(value["userId"], id.to_string());

        let json = encode_outbound(&OutboundEvent::Typing {
            sender_id: id,
            is_typing: false,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["isTyping"], false);
        assert_eq!(value["senderId"], id.to_string());
    }
}
