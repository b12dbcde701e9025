//! Connection lifecycle handling
//!
//! [`RelayService`] is the seam between the message transport and the relay
//! core. The transport calls in for every connect, framed event, transport
//! error, and disconnect; the service serializes those calls through one lock
//! so a role change and the fanout decision it affects never interleave.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::event::ClientEvent;
use super::message::Outbound;
use super::router::RelayRouter;
use crate::registry::{ConnectionId, RegistryCounts};
use crate::stats::{ServerSnapshot, StatusReporter};

/// Thread-safe entry point for transport events
///
/// Every method is a short, non-blocking, run-to-completion step. Cleanup on
/// disconnect does not depend on the client having sent `stop-stream` or
/// `stop-listening` first, and runs its notifications at most once per
/// connection.
#[derive(Debug)]
pub struct RelayService {
    status: StatusReporter,
    router: Mutex<RelayRouter>,
}

impl RelayService {
    /// Create a service with an empty registry
    pub fn new(status: StatusReporter) -> Self {
        Self {
            router: Mutex::new(RelayRouter::new(status.clone())),
            status,
        }
    }

    /// Record a new transport connection
    ///
    /// Connections carry no registry state until they pick a role, so this
    /// only logs.
    pub fn client_connected(&self, id: ConnectionId) {
        tracing::info!(connection = %id, "Client connected");
    }

    /// Process one client event, returning the notifications to deliver
    pub fn handle_event(&self, id: ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        self.router().dispatch(id, event)
    }

    /// Process a transport disconnect, returning the notifications to deliver
    pub fn client_disconnected(&self, id: ConnectionId, reason: &str) -> Vec<Outbound> {
        self.router().disconnect(id, reason)
    }

    /// Record a transport-level error on a connection
    ///
    /// The connection is treated as still alive until the transport reports a
    /// disconnect.
    pub fn transport_error(&self, id: ConnectionId, error: &str) {
        tracing::warn!(connection = %id, error = error, "Transport error on connection");
    }

    /// Current group sizes
    pub fn counts(&self) -> RegistryCounts {
        self.router().registry().counts()
    }

    /// Status snapshot for the embedding HTTP layer
    pub fn snapshot(&self) -> ServerSnapshot {
        self.status.snapshot(self.counts())
    }

    fn router(&self) -> MutexGuard<'_, RelayRouter> {
        // Poisoning is absorbed: one panicked caller must not disable the
        // relay for every other connection.
        self.router.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
