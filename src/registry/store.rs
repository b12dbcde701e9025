//! Session registry implementation
//!
//! Tracks which connections currently hold the streamer or listener role.
//! Every operation is a total function: unknown identities are accepted and
//! removals of roles never held are no-ops.

use std::collections::HashMap;

use super::connection::ConnectionId;
use super::role::Role;

/// Snapshot of group sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryCounts {
    /// Number of connections currently streaming
    pub streamers: usize,
    /// Number of connections currently listening
    pub listeners: usize,
}

/// Authoritative mapping from connection identity to role
///
/// Only non-idle roles are stored; an absent entry means [`Role::Idle`].
/// Membership tests and removal are O(1) map operations. The registry is not
/// internally synchronized: the relay service guards it together with the
/// broadcast decision under a single lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    roles: HashMap<ConnectionId, Role>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the role held by a connection
    pub fn role(&self, id: ConnectionId) -> Role {
        self.roles.get(&id).copied().unwrap_or(Role::Idle)
    }

    /// Mark a connection as streamer
    ///
    /// Idempotent. Replaces a listener role if one was held.
    pub fn mark_streamer(&mut self, id: ConnectionId) {
        self.roles.insert(id, Role::Streamer);
    }

    /// Mark a connection as listener
    ///
    /// Idempotent. Replaces a streamer role if one was held.
    pub fn mark_listener(&mut self, id: ConnectionId) {
        self.roles.insert(id, Role::Listener);
    }

    /// Remove the streamer role from a connection; no-op if it is not a streamer
    pub fn unmark_streamer(&mut self, id: ConnectionId) {
        if self.role(id) == Role::Streamer {
            self.roles.remove(&id);
        }
    }

    /// Remove the listener role from a connection; no-op if it is not a listener
    pub fn unmark_listener(&mut self, id: ConnectionId) {
        if self.role(id) == Role::Listener {
            self.roles.remove(&id);
        }
    }

    /// Remove whatever role a connection holds, returning the prior role
    pub fn remove(&mut self, id: ConnectionId) -> Role {
        self.roles.remove(&id).unwrap_or(Role::Idle)
    }

    /// Check whether a connection is currently a streamer
    pub fn is_streamer(&self, id: ConnectionId) -> bool {
        self.role(id).is_streamer()
    }

    /// Check whether a connection is currently a listener
    pub fn is_listener(&self, id: ConnectionId) -> bool {
        self.role(id).is_listener()
    }

    /// Get a snapshot of the current group sizes
    ///
    /// Computed from live membership on every call, never cached.
    pub fn counts(&self) -> RegistryCounts {
        let mut counts = RegistryCounts::default();
        for role in self.roles.values() {
            match role {
                Role::Streamer => counts.streamers += 1,
                Role::Listener => counts.listeners += 1,
                Role::Idle => {}
            }
        }
        counts
    }

    /// Collect the listener group, excluding one connection
    ///
    /// The exclusion keeps a sender out of its own fanout regardless of what
    /// role it holds.
    pub fn listeners_except(&self, exclude: Option<ConnectionId>) -> Vec<ConnectionId> {
        self.roles
            .iter()
            .filter(|(id, role)| role.is_listener() && Some(**id) != exclude)
            .map(|(id, _)| *id)
            .collect()
    }
}
