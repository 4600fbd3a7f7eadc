//! WebSocket event types and JSON framing.

pub mod serializer;
pub mod types;

pub use serializer::{DecodeError, decode_inbound, encode_outbound};
pub use types::{InboundEvent, OutboundEvent};
