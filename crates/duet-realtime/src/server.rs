//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use duet_core::config::RealtimeConfig;
use duet_database::ChatStore;

use crate::broadcast::broadcaster::EventBroadcaster;
use crate::connection::handle::{CloseReason, ConnectionHandle, ConnectionId};
use crate::connection::heartbeat::HeartbeatConfig;
use crate::connection::lifecycle::ConnectionLifecycle;
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::presence::tracker::PresenceTracker;
use crate::routing::router::MessageRouter;
use crate::typing::relay::TypingRelay;

/// Central real-time engine that coordinates all WebSocket subsystems.
///
/// Cheap to clone; every component is shared behind an `Arc`.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Identity → connection bindings.
    pub registry: Arc<ConnectionRegistry>,
    /// Store-backed presence.
    pub presence: PresenceTracker,
    /// Chat message routing.
    pub router: MessageRouter,
    /// Typing indicator relay.
    pub typing: TypingRelay,
    /// Presence fan-out.
    pub broadcaster: EventBroadcaster,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Durable store.
    pub store: Arc<dyn ChatStore>,
    config: Arc<RealtimeConfig>,
    /// Every open connection, authenticated or not.
    open: Arc<DashMap<ConnectionId, Arc<ConnectionHandle>>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("open_connections", &self.open.len())
            .field("bound_identities", &self.registry.len())
            .finish()
    }
}

/// Point-in-time engine statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStats {
    /// Open sockets, authenticated or not.
    pub open_connections: usize,
    /// Identities with a bound connection.
    pub bound_identities: usize,
    /// Counters.
    pub metrics: MetricsSnapshot,
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: RealtimeConfig, store: Arc<dyn ChatStore>) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let presence = PresenceTracker::new(store.clone(), metrics.clone());
        let router = MessageRouter::new(registry.clone(), store.clone(), metrics.clone());
        let typing = TypingRelay::new(registry.clone(), metrics.clone());
        let broadcaster = EventBroadcaster::new(registry.clone(), metrics.clone());

        info!(
            outbound_buffer = config.outbound_buffer_size,
            ping_interval_secs = config.ping_interval_seconds,
            "Real-time engine initialized"
        );

        Self {
            registry,
            presence,
            router,
            typing,
            broadcaster,
            metrics,
            store,
            config: Arc::new(config),
            open: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(self.config.as_ref())
    }

    /// Accept a new transport.
    ///
    /// Returns the connection's state machine and the receiving end of its
    /// outbound queue, which the socket writer task drains.
    pub fn open_connection(&self) -> (ConnectionLifecycle, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.open.insert(handle.id, handle.clone());
        self.metrics.record_connect();
        tracing::debug!(connection_id = %handle.id, "Connection opened");

        if self.shutdown.is_cancelled() {
            handle.close(CloseReason::ServerShutdown);
        }
        (ConnectionLifecycle::new(handle, self.clone()), rx)
    }

    /// Forget a closed connection. Returns whether it was still open.
    pub(crate) fn release(&self, conn_id: ConnectionId) -> bool {
        let removed = self.open.remove(&conn_id).is_some();
        if removed {
            self.metrics.record_disconnect();
        }
        removed
    }

    pub fn open_connections(&self) -> usize {
        self.open.len()
    }

    pub fn stats(&self) -> RealtimeStats {
        RealtimeStats {
            open_connections: self.open.len(),
            bound_identities: self.registry.len(),
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Ask every open connection to close.
    pub fn close_all(&self, reason: CloseReason) {
        let handles: Vec<_> = self.open.iter().map(|e| e.value().clone()).collect();
        for handle in handles {
            handle.close(reason);
        }
    }

    /// Initiates a graceful shutdown of the real-time engine.
    ///
    /// Refuses new connections, closes existing ones, and waits up to
    /// `grace` for their close handling (presence writes) to finish.
    pub async fn shutdown(&self, grace: Duration) {
        info!(open = self.open.len(), "Shutting down real-time engine");
        self.shutdown.cancel();
        self.close_all(CloseReason::ServerShutdown);

        let drained = tokio::time::timeout(grace, async {
            while !self.open.is_empty() {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => info!("Real-time engine shut down"),
            Err(_) => tracing::warn!(
                remaining = self.open.len(),
                "Real-time engine shutdown grace period elapsed"
            ),
        }
    }
}
