//! Ping/pong heartbeat checks for WebSocket keepalive.

use std::time::Duration;

use chrono::{DateTime, Utc};

use duet_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence allowed before the transport is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Result of one heartbeat check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatStatus {
    /// Heard from the client recently enough.
    Healthy,
    /// Silent since the given instant.
    TimedOut {
        /// Last pong or inbound frame
        since: DateTime<Utc>,
    },
}

impl HeartbeatConfig {
    /// Check a connection against the current time.
    pub async fn check(&self, handle: &ConnectionHandle) -> HeartbeatStatus {
        self.check_at(handle, Utc::now()).await
    }

    /// Check a connection against `now`.
    pub async fn check_at(&self, handle: &ConnectionHandle, now: DateTime<Utc>) -> HeartbeatStatus {
        let last_heard = handle.last_heard().await;
        match (now - last_heard).to_std() {
            Ok(elapsed) if elapsed > self.ping_timeout => {
                tracing::warn!(
                    connection_id = %handle.id,
                    elapsed_secs = elapsed.as_secs(),
                    "Connection heartbeat timeout"
                );
                HeartbeatStatus::TimedOut { since: last_heard }
            }
            _ => HeartbeatStatus::Healthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_fresh_connection_is_healthy() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        assert_eq!(config().check(&handle).await, HeartbeatStatus::Healthy);
    }

    #[tokio::test]
    async fn test_silence_past_timeout_times_out() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        let later = Utc::now() + chrono::Duration::seconds(31);
        assert!(matches!(
            config().check_at(&handle, later).await,
            HeartbeatStatus::TimedOut { .. }
        ));
    }

    #[tokio::test]
    async fn test_activity_counts_as_life() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        let started = handle.connected_at;
        handle.touch().await;
        let probe = handle.last_activity().await + chrono::Duration::seconds(29);
        assert!(probe >= started);
        assert_eq!(
            config().check_at(&handle, probe).await,
            HeartbeatStatus::Healthy
        );
    }

    #[test]
    fn test_from_realtime_config() {
        let hb = HeartbeatConfig::from(&RealtimeConfig::default());
        assert_eq!(hb.ping_interval, Duration::from_secs(30));
        assert_eq!(hb.ping_timeout, Duration::from_secs(75));
    }
}
