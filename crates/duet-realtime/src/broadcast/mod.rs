//! Presence fan-out to every live connection.

pub mod broadcaster;

pub use broadcaster::{BroadcastReport, EventBroadcaster};
