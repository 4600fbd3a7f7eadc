//! Typing-signal relay. Nothing here is persisted.

use std::sync::Arc;

use duet_core::types::id::UserId;

use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::EngineMetrics;

/// Forwards typing indicators to the receiver's connection, if any.
#[derive(Debug, Clone)]
pub struct TypingRelay {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<EngineMetrics>,
}

impl TypingRelay {
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<EngineMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Forward `{sender_id, is_typing}` to `receiver_id`.
    ///
    /// Returns whether the signal was queued. An absent or dead receiver
    /// drops it silently.
    pub fn relay(&self, sender_id: UserId, receiver_id: UserId, is_typing: bool) -> bool {
        let delivered = self
            .registry
            .lookup(receiver_id)
            .filter(|handle| handle.is_alive())
            .is_some_and(|handle| {
                handle
                    .send(OutboundEvent::Typing {
                        sender_id,
                        is_typing,
                    })
                    .is_ok()
            });
        self.metrics.record_delivery(delivered);
        if !delivered {
            tracing::trace!(sender_id = %sender_id, receiver_id = %receiver_id, "Typing signal dropped");
        }
        delivered
    }
}
