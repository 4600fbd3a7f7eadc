//! Presence tracking backed by the durable store.

pub mod event;
pub mod tracker;

pub use event::{PresenceEvent, PresenceKind};
pub use tracker::PresenceTracker;
