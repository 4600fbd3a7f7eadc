//! Presence change events produced by the tracker.

use chrono::{DateTime, Utc};

use duet_core::types::id::UserId;
use duet_entity::presence::PresenceState;

use crate::message::types::OutboundEvent;

/// Which kind of presence change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceKind {
    UserOnline,
    UserOffline,
    UserStatusUpdate,
}

/// A presence change that has been written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEvent {
    pub kind: PresenceKind,
    pub user_id: UserId,
    pub is_online: bool,
    pub timestamp: DateTime<Utc>,
}

impl PresenceEvent {
    /// Build an event from the state the store returned.
    pub fn from_state(kind: PresenceKind, state: PresenceState) -> Self {
        Self {
            kind,
            user_id: state.user_id,
            is_online: state.is_online,
            timestamp: state.last_seen_at,
        }
    }

    /// The wire event broadcast to every live connection.
    pub fn to_outbound(&self) -> OutboundEvent {
        match self.kind {
            PresenceKind::UserOnline => OutboundEvent::UserOnline {
                user_id: self.user_id,
            },
            PresenceKind::UserOffline => OutboundEvent::UserOffline {
                user_id: self.user_id,
            },
            PresenceKind::UserStatusUpdate => OutboundEvent::UserStatusUpdate {
                user_id: self.user_id,
                last_seen: self.timestamp,
                is_online: self.is_online,
            },
        }
    }
}
