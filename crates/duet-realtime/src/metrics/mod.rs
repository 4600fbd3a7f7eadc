//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections accepted
    pub connections_opened: AtomicU64,
    /// Connections currently open
    pub connections_active: AtomicU64,
    /// Inbound frames decoded successfully
    pub events_received: AtomicU64,
    /// Inbound frames dropped (malformed, unknown, out of state)
    pub events_rejected: AtomicU64,
    /// Outbound events queued to a live connection
    pub events_delivered: AtomicU64,
    /// Outbound events skipped (no binding, dead transport, full buffer)
    pub deliveries_skipped: AtomicU64,
    /// Chat messages written to the store
    pub messages_persisted: AtomicU64,
    /// Chat payloads rejected by validation
    pub validation_failures: AtomicU64,
    /// Store operations that failed
    pub store_failures: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection
    pub fn record_connect(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn record_disconnect(&self) {
        // Saturate so a double close can never wrap the gauge.
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one delivery attempt
    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.events_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.deliveries_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_persisted(&self) {
        self.messages_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            deliveries_skipped: self.deliveries_skipped.load(Ordering::Relaxed),
            messages_persisted: self.messages_persisted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub connections_opened: u64,
    pub connections_active: u64,
    pub events_received: u64,
    pub events_rejected: u64,
    pub events_delivered: u64,
    pub deliveries_skipped: u64,
    pub messages_persisted: u64,
    pub validation_failures: u64,
    pub store_failures: u64,
}
