//! Per-connection state machine.
//!
//! One `ConnectionLifecycle` exists per socket. The socket task feeds it
//! inbound frames one at a time and awaits each before reading the next,
//! so events from a single connection are handled in arrival order.

use std::sync::Arc;

use duet_core::types::id::UserId;

use super::handle::{CloseReason, ConnectionHandle, ConnectionId};
use crate::message::serializer::decode_inbound;
use crate::message::types::InboundEvent;
use crate::routing::validator::ChatPayload;
use crate::server::RealtimeEngine;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected, no `auth` accepted yet.
    Unauthenticated,
    /// Bound to `user_id` in the registry.
    Authenticated {
        /// The bound identity.
        user_id: UserId,
    },
    /// Terminal.
    Closed,
}

/// Drives one connection through `Unauthenticated → Authenticated → Closed`.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    handle: Arc<ConnectionHandle>,
    state: ConnectionState,
    engine: RealtimeEngine,
}

impl ConnectionLifecycle {
    pub(crate) fn new(handle: Arc<ConnectionHandle>, engine: RealtimeEngine) -> Self {
        Self {
            handle,
            state: ConnectionState::Unauthenticated,
            engine,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// The authenticated identity, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self.state {
            ConnectionState::Authenticated { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// Handle one inbound text frame. Undecodable frames are logged and
    /// dropped; the client gets no error event.
    pub async fn handle_text(&mut self, raw: &str) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.handle.touch().await;

        match decode_inbound(raw, self.engine.config().max_inbound_frame_bytes) {
            Ok(event) => {
                self.engine.metrics.record_received();
                self.handle_event(event).await;
            }
            Err(e) => {
                self.engine.metrics.record_rejected();
                tracing::warn!(connection_id = %self.handle.id, error = %e, "Dropped inbound frame");
            }
        }
    }

    /// Apply one decoded event to the state machine.
    pub async fn handle_event(&mut self, event: InboundEvent) {
        match (self.state, event) {
            (ConnectionState::Closed, _) => {}

            (_, InboundEvent::Auth { user_id }) => self.authenticate(user_id).await,

            (ConnectionState::Unauthenticated, event) => {
                self.engine.metrics.record_rejected();
                tracing::warn!(
                    connection_id = %self.handle.id,
                    event = event.kind(),
                    "Dropped event on unauthenticated connection"
                );
            }

            (ConnectionState::Authenticated { user_id }, InboundEvent::ChatMessage { data }) => {
                self.chat_message(user_id, &data).await;
            }

            (
                ConnectionState::Authenticated { user_id },
                InboundEvent::Typing {
                    sender_id,
                    receiver_id,
                    is_typing,
                },
            ) => {
                if sender_id != user_id {
                    self.reject_impersonation("typing", user_id, sender_id);
                    return;
                }
                self.engine.typing.relay(sender_id, receiver_id, is_typing);
            }

            (
                ConnectionState::Authenticated { user_id },
                InboundEvent::UpdateLastSeen { user_id: claimed },
            ) => {
                if claimed != user_id {
                    self.reject_impersonation("update_last_seen", user_id, claimed);
                    return;
                }
                if let Ok(event) = self.engine.presence.touch_last_seen(user_id).await {
                    self.engine.broadcaster.broadcast(&event);
                }
            }
        }
    }

    async fn authenticate(&mut self, user_id: UserId) {
        match self.state {
            ConnectionState::Closed => return,
            ConnectionState::Authenticated { user_id: bound } if bound == user_id => {
                // Already bound: refresh the store, keep broadcasts to one per bind.
                let _ = self.engine.presence.mark_online(user_id).await;
                return;
            }
            ConnectionState::Authenticated { user_id: bound } => {
                self.engine.metrics.record_rejected();
                tracing::warn!(
                    connection_id = %self.handle.id,
                    bound_user = %bound,
                    requested_user = %user_id,
                    "Dropped auth for a different identity on an authenticated connection"
                );
                return;
            }
            ConnectionState::Unauthenticated => {}
        }

        if self.engine.config().verify_user_on_auth {
            match self.engine.store.get_user(user_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.engine.metrics.record_rejected();
                    tracing::warn!(
                        connection_id = %self.handle.id,
                        user_id = %user_id,
                        "Dropped auth for unknown user"
                    );
                    return;
                }
                Err(e) => {
                    self.engine.metrics.record_store_failure();
                    tracing::warn!(
                        connection_id = %self.handle.id,
                        user_id = %user_id,
                        error = %e,
                        "Could not verify user on auth, accepting"
                    );
                }
            }
        }

        // The socket may have died while the store lookup was in flight.
        if self.handle.is_closed() {
            return;
        }

        if let Some(superseded) = self.engine.registry.bind(user_id, self.handle.clone()) {
            tracing::info!(
                user_id = %user_id,
                old_connection = %superseded.id,
                new_connection = %self.handle.id,
                "Closing superseded connection"
            );
            superseded.close(CloseReason::Superseded);
        }
        self.state = ConnectionState::Authenticated { user_id };
        tracing::info!(connection_id = %self.handle.id, user_id = %user_id, "Connection authenticated");

        if let Ok(event) = self.engine.presence.mark_online(user_id).await {
            self.engine.broadcaster.broadcast(&event);
        }
    }

    async fn chat_message(&self, user_id: UserId, data: &ChatPayload) {
        // Errors are logged and counted by the router.
        let _ = self.engine.router.route(user_id, data).await;
    }

    fn reject_impersonation(&self, event: &'static str, bound: UserId, claimed: UserId) {
        self.engine.metrics.record_rejected();
        tracing::warn!(
            connection_id = %self.handle.id,
            event,
            bound_user = %bound,
            claimed_user = %claimed,
            "Dropped event claiming another identity"
        );
    }

    /// Tear the connection down. Idempotent.
    ///
    /// Presence flips offline only if this connection still owned the
    /// identity's binding. If another connection binds the identity while
    /// the offline write is in flight, the online flag is written back and
    /// no `user_offline` goes out.
    pub async fn close(&mut self, reason: CloseReason) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        if previous == ConnectionState::Closed {
            return;
        }

        self.handle.close(reason);
        let reason = self.handle.close_reason().unwrap_or(reason);

        if let ConnectionState::Authenticated { user_id } = previous {
            if self.engine.registry.unbind_connection(user_id, self.handle.id) {
                if let Ok(event) = self.engine.presence.mark_offline(user_id).await {
                    if self.engine.registry.is_bound(user_id) {
                        tracing::debug!(
                            connection_id = %self.handle.id,
                            user_id = %user_id,
                            "Identity rebound during offline write, restoring online"
                        );
                        let _ = self.engine.presence.mark_online(user_id).await;
                    } else {
                        self.engine.broadcaster.broadcast(&event);
                    }
                }
            } else {
                tracing::debug!(
                    connection_id = %self.handle.id,
                    user_id = %user_id,
                    "Closed connection was no longer bound, presence unchanged"
                );
            }
        }

        self.engine.release(self.handle.id);
        tracing::info!(connection_id = %self.handle.id, %reason, "Connection closed");
    }
}
