//! # duet-realtime
//!
//! Real-time presence and message-delivery core for Duet. Provides:
//!
//! - Connection registry binding each user to a single live connection
//! - Presence tracking written through to the durable store
//! - Message routing with validation, persistence, and delivery receipts
//! - Best-effort typing indicator relay
//! - Presence fan-out to every live connection
//! - A per-connection lifecycle state machine tying the above together

pub mod broadcast;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod routing;
pub mod server;
pub mod typing;

pub use broadcast::broadcaster::EventBroadcaster;
pub use connection::handle::{CloseReason, ConnectionHandle};
pub use connection::lifecycle::{ConnectionLifecycle, ConnectionState};
pub use connection::registry::ConnectionRegistry;
pub use message::types::{InboundEvent, OutboundEvent};
pub use presence::tracker::PresenceTracker;
pub use routing::router::MessageRouter;
pub use server::{RealtimeEngine, RealtimeStats};
pub use typing::relay::TypingRelay;
