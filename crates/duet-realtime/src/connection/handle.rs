//! Individual WebSocket connection handle.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::message::types::OutboundEvent;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Why a connection was closed by the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame or the stream ended.
    ClientClosed,
    /// Reading from or writing to the socket failed.
    TransportError,
    /// No pong or inbound traffic within the heartbeat timeout.
    HeartbeatTimeout,
    /// The same identity authenticated on a newer connection.
    Superseded,
    /// The server is shutting down.
    ServerShutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientClosed => "client_closed",
            Self::TransportError => "transport_error",
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::Superseded => "superseded",
            Self::ServerShutdown => "server_shutdown",
        };
        f.write_str(s)
    }
}

/// Why an outbound event could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection is closed or its writer has gone away.
    #[error("connection transport is dead")]
    DeadTransport,
    /// The outbound queue is at capacity.
    #[error("connection send buffer is full")]
    BufferFull,
}

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender feeding the socket writer task plus liveness
/// metadata. The handle knows nothing about identity; the registry owns
/// the identity-to-connection binding.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound events
    sender: mpsc::Sender<OutboundEvent>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last inbound frame timestamp
    last_activity: RwLock<DateTime<Utc>>,
    /// Last pong received
    last_pong: RwLock<DateTime<Utc>>,
    alive: AtomicBool,
    cancel: CancellationToken,
    close_reason: OnceLock<CloseReason>,
}

impl ConnectionHandle {
    /// Create a handle around the writer side of an outbound queue.
    pub fn new(sender: mpsc::Sender<OutboundEvent>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sender,
            connected_at: now,
            last_activity: RwLock::new(now),
            last_pong: RwLock::new(now),
            alive: AtomicBool::new(true),
            cancel: CancellationToken::new(),
            close_reason: OnceLock::new(),
        }
    }

    /// Queue an outbound event without waiting.
    ///
    /// A full buffer drops the event for this connection only. A closed
    /// receiver marks the handle dead.
    pub fn send(&self, event: OutboundEvent) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::DeadTransport);
        }
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    event = event.kind(),
                    "Connection send buffer full, dropping event"
                );
                Err(DeliveryError::BufferFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(DeliveryError::DeadTransport)
            }
        }
    }

    /// Whether the transport can still accept events.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Close the connection. The first reason recorded wins.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.close_reason.set(reason);
        self.mark_dead();
        self.cancel.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The reason passed to the first [`close`](Self::close) call.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        *self.last_pong.write().await = Utc::now();
    }

    pub async fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().await
    }

    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }

    /// Most recent sign of life from the client.
    pub async fn last_heard(&self) -> DateTime<Utc> {
        self.last_pong().await.max(self.last_activity().await)
    }
}
