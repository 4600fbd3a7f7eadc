//! Ephemeral typing indicator relay.

pub mod relay;

pub use relay::TypingRelay;
