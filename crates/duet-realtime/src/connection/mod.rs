//! WebSocket connection management: handles, the identity registry,
//! heartbeat checks, and the per-connection lifecycle.

pub mod handle;
pub mod heartbeat;
pub mod lifecycle;
pub mod registry;

pub use handle::{CloseReason, ConnectionHandle, ConnectionId, DeliveryError};
pub use lifecycle::{ConnectionLifecycle, ConnectionState};
pub use registry::ConnectionRegistry;
