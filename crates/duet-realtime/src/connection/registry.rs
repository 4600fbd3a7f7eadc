//! Connection registry: the authoritative identity → connection binding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use duet_core::types::id::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// One identity's current connection.
#[derive(Debug, Clone)]
pub struct ConnectionBinding {
    /// Bound identity
    pub user_id: UserId,
    /// The connection
    pub handle: Arc<ConnectionHandle>,
    /// When the binding was made
    pub bound_at: DateTime<Utc>,
}

/// Thread-safe map from identity to its single live connection.
///
/// At most one connection per identity. Both indexes are updated under
/// the `by_user` entry lock, always acquired before `by_conn`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_user: DashMap<UserId, ConnectionBinding>,
    by_conn: DashMap<ConnectionId, UserId>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `user_id` to `handle`, replacing any existing binding.
    ///
    /// Returns the superseded handle when a different connection was bound.
    /// Rebinding the same connection is a no-op and returns `None`.
    pub fn bind(
        &self,
        user_id: UserId,
        handle: Arc<ConnectionHandle>,
    ) -> Option<Arc<ConnectionHandle>> {
        let conn_id = handle.id;
        let binding = ConnectionBinding {
            user_id,
            handle,
            bound_at: Utc::now(),
        };

        match self.by_user.entry(user_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().handle.id == conn_id {
                    return None;
                }
                let previous = std::mem::replace(entry.get_mut(), binding);
                self.by_conn.remove(&previous.handle.id);
                self.by_conn.insert(conn_id, user_id);
                tracing::debug!(
                    user_id = %user_id,
                    old_connection = %previous.handle.id,
                    new_connection = %conn_id,
                    "Replaced existing connection binding"
                );
                Some(previous.handle)
            }
            Entry::Vacant(entry) => {
                entry.insert(binding);
                self.by_conn.insert(conn_id, user_id);
                None
            }
        }
    }

    /// Remove whatever connection `user_id` has bound.
    pub fn unbind(&self, user_id: UserId) -> Option<Arc<ConnectionHandle>> {
        match self.by_user.entry(user_id) {
            Entry::Occupied(entry) => {
                let binding = entry.remove();
                self.by_conn.remove(&binding.handle.id);
                Some(binding.handle)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Remove the binding only if it still points at `conn_id`.
    ///
    /// Returns `true` when this call removed it. A connection closing
    /// after it was superseded gets `false` and must not touch presence.
    pub fn unbind_connection(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        match self.by_user.entry(user_id) {
            Entry::Occupied(entry) if entry.get().handle.id == conn_id => {
                entry.remove();
                self.by_conn.remove(&conn_id);
                true
            }
            _ => false,
        }
    }

    /// The connection bound to `user_id`, if any.
    pub fn lookup(&self, user_id: UserId) -> Option<Arc<ConnectionHandle>> {
        self.by_user.get(&user_id).map(|b| b.handle.clone())
    }

    /// The identity a connection is bound to, if any.
    pub fn find_identity(&self, conn_id: ConnectionId) -> Option<UserId> {
        self.by_conn.get(&conn_id).map(|u| *u)
    }

    pub fn is_bound(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// Snapshot of every binding.
    pub fn connections(&self) -> Vec<(UserId, Arc<ConnectionHandle>)> {
        self.by_user
            .iter()
            .map(|entry| (*entry.key(), entry.value().handle.clone()))
            .collect()
    }

    /// Call `f` for every binding.
    ///
    /// Iterates a snapshot, so `f` may call back into the registry.
    pub fn for_each_connection<F>(&self, mut f: F)
    where
        F: FnMut(UserId, &Arc<ConnectionHandle>),
    {
        for (user_id, handle) in self.connections() {
            f(user_id, &handle);
        }
    }

    /// Identities that currently have a binding.
    pub fn identities(&self) -> Vec<UserId> {
        self.by_user.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}
