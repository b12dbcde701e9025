//! Relay router state machine
//!
//! Processes role transitions and payload events for one connection at a
//! time and returns the outbound notifications they produce. Dispatch is
//! synchronous and run-to-completion: the registry state read when a chunk
//! is forwarded always reflects the most recently processed transition.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::event::ClientEvent;
use super::message::{Outbound, ServerMessage, StopReason};
use crate::registry::{ConnectionId, SessionRegistry};
use crate::stats::StatusReporter;

/// Routes events between streamers and the listener group
///
/// Owns the [`SessionRegistry`]; the surrounding service serializes access so
/// that a role change and the broadcast decision it affects are a single
/// atomic step.
#[derive(Debug)]
pub struct RelayRouter {
    registry: SessionRegistry,
    status: StatusReporter,
}

impl RelayRouter {
    /// Create a router with an empty registry
    pub fn new(status: StatusReporter) -> Self {
        Self {
            registry: SessionRegistry::new(),
            status,
        }
    }

    /// Read-only access to the registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Process one client event, returning the notifications to deliver
    pub fn dispatch(&mut self, id: ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::StartStream => self.start_stream(id),
            ClientEvent::JoinStream => self.join_stream(id),
            ClientEvent::AudioChunk(payload) => self.forward_chunk(id, payload),
            ClientEvent::StopStream => self.stop_stream(id),
            ClientEvent::StopListening => self.stop_listening(id),
            ClientEvent::GetStatus => self.get_status(id),
        }
    }

    /// Process a transport disconnect
    ///
    /// Runs the same cleanup whether or not the client sent a clean
    /// `stop-stream`/`stop-listening` first. Once the role is removed a
    /// repeated disconnect for the same id finds nothing to do, so listeners
    /// are notified at most once per vanished streamer.
    pub fn disconnect(&mut self, id: ConnectionId, reason: &str) -> Vec<Outbound> {
        let prior = self.registry.remove(id);
        let counts = self.registry.counts();
        tracing::info!(
            connection = %id,
            reason = reason,
            role = ?prior,
            streamers = counts.streamers,
            listeners = counts.listeners,
            "Client disconnected"
        );

        if prior.is_streamer() {
            self.streamer_stopped(id, StopReason::Disconnect)
        } else {
            Vec::new()
        }
    }

    fn start_stream(&mut self, id: ConnectionId) -> Vec<Outbound> {
        if self.registry.is_streamer(id) {
            // Repeated start-stream is idempotent; listeners were already told
            tracing::debug!(connection = %id, "start-stream from active streamer ignored");
            return Vec::new();
        }

        self.registry.mark_streamer(id);
        tracing::info!(
            connection = %id,
            streamers = self.registry.counts().streamers,
            "Streamer started"
        );

        let recipients = self.registry.listeners_except(Some(id));
        if recipients.is_empty() {
            return Vec::new();
        }
        vec![Outbound::fanout(
            recipients,
            ServerMessage::StreamerStarted {
                streamer_id: id,
                timestamp: unix_millis(),
            },
        )]
    }

    fn join_stream(&mut self, id: ConnectionId) -> Vec<Outbound> {
        let mut out = Vec::new();

        // An active streamer switching to listening ends its stream first, so
        // the listener group is told instead of waiting on a silent stream.
        if self.registry.is_streamer(id) {
            out.extend(self.stop_stream(id));
        }

        self.registry.mark_listener(id);
        let counts = self.registry.counts();
        tracing::info!(connection = %id, listeners = counts.listeners, "Listener joined");

        if counts.streamers > 0 {
            out.push(Outbound::unicast(
                id,
                ServerMessage::StreamerAvailable {
                    streamers_count: counts.streamers,
                },
            ));
        }
        out
    }

    fn forward_chunk(&mut self, id: ConnectionId, payload: Bytes) -> Vec<Outbound> {
        if !self.registry.is_streamer(id) {
            tracing::debug!(
                connection = %id,
                bytes = payload.len(),
                "Dropping audio chunk from non-streamer"
            );
            return Vec::new();
        }

        let recipients = self.registry.listeners_except(Some(id));
        tracing::trace!(
            connection = %id,
            bytes = payload.len(),
            listeners = recipients.len(),
            "Forwarding audio chunk"
        );
        if recipients.is_empty() {
            return Vec::new();
        }
        vec![Outbound::fanout(
            recipients,
            ServerMessage::AudioChunk(payload),
        )]
    }

    fn stop_stream(&mut self, id: ConnectionId) -> Vec<Outbound> {
        if !self.registry.is_streamer(id) {
            tracing::debug!(connection = %id, "stop-stream from non-streamer ignored");
            return Vec::new();
        }

        self.registry.unmark_streamer(id);
        tracing::info!(
            connection = %id,
            streamers = self.registry.counts().streamers,
            "Streamer stopped"
        );
        self.streamer_stopped(id, StopReason::Manual)
    }

    fn stop_listening(&mut self, id: ConnectionId) -> Vec<Outbound> {
        if !self.registry.is_listener(id) {
            tracing::debug!(connection = %id, "stop-listening from non-listener ignored");
            return Vec::new();
        }

        self.registry.unmark_listener(id);
        tracing::info!(
            connection = %id,
            listeners = self.registry.counts().listeners,
            "Listener left"
        );
        // Listeners leaving is not newsworthy to anyone else
        Vec::new()
    }

    fn get_status(&mut self, id: ConnectionId) -> Vec<Outbound> {
        let snapshot = self.status.snapshot(self.registry.counts());
        vec![Outbound::unicast(id, ServerMessage::ServerStatus(snapshot))]
    }

    /// Tell the listener group that `id`'s stream ended
    fn streamer_stopped(&self, id: ConnectionId, reason: StopReason) -> Vec<Outbound> {
        let recipients = self.registry.listeners_except(Some(id));
        if recipients.is_empty() {
            return Vec::new();
        }
        vec![Outbound::fanout(
            recipients,
            ServerMessage::StreamerStopped {
                streamer_id: id,
                reason,
                timestamp: unix_millis(),
            },
        )]
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
