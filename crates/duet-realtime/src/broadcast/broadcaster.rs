//! Event broadcaster: one presence event to every bound connection.

use std::sync::Arc;

use crate::connection::registry::ConnectionRegistry;
use crate::metrics::EngineMetrics;
use crate::presence::event::PresenceEvent;

/// How a broadcast went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the event was queued to.
    pub delivered: usize,
    /// Connections skipped as dead or backed up.
    pub skipped: usize,
}

/// Fans presence events out to every bound connection.
///
/// Sends never wait: each connection has its own bounded queue and a
/// full queue drops the event for that connection only.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<EngineMetrics>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, metrics: Arc<EngineMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Send `event` to every live bound connection, the subject included.
    pub fn broadcast(&self, event: &PresenceEvent) -> BroadcastReport {
        let outbound = event.to_outbound();
        let mut report = BroadcastReport::default();

        self.registry.for_each_connection(|user_id, handle| {
            let delivered = handle.is_alive() && handle.send(outbound.clone()).is_ok();
            self.metrics.record_delivery(delivered);
            if delivered {
                report.delivered += 1;
            } else {
                report.skipped += 1;
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %handle.id,
                    event = outbound.kind(),
                    "Skipped broadcast to unavailable connection"
                );
            }
        });

        tracing::debug!(
            subject = %event.user_id,
            event = outbound.kind(),
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast presence event"
        );
        report
    }
}
