//! Server-to-client notifications
//!
//! Messages are cheap to clone: audio payloads ride in `bytes::Bytes`, so a
//! fanout to many listeners reference-counts one allocation instead of
//! copying it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::registry::ConnectionId;
use crate::stats::ServerSnapshot;

/// Why a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The streamer sent `stop-stream`
    Manual,
    /// The streamer's connection went away
    Disconnect,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Manual => write!(f, "manual"),
            StopReason::Disconnect => write!(f, "disconnect"),
        }
    }
}

/// Notification sent to one or more client connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A stream went live; sent to the listener group
    #[serde(rename_all = "camelCase")]
    StreamerStarted {
        streamer_id: ConnectionId,
        /// Unix timestamp in milliseconds
        timestamp: u64,
    },
    /// A stream ended; sent to the listener group
    #[serde(rename_all = "camelCase")]
    StreamerStopped {
        streamer_id: ConnectionId,
        reason: StopReason,
        timestamp: u64,
    },
    /// A stream is already live; sent to a newly joined listener only
    #[serde(rename_all = "camelCase")]
    StreamerAvailable { streamers_count: usize },
    /// Forwarded audio payload, byte-for-byte as received
    AudioChunk(Bytes),
    /// Status snapshot; sent to the requester only
    ServerStatus(ServerSnapshot),
}

/// One delivery: a message plus the explicit list of recipients
///
/// The router computes recipients itself (listener group minus the excluded
/// sender); the transport only has to send `message` to each id in `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Recipient connections
    pub to: Vec<ConnectionId>,
    /// Message to deliver to every recipient
    pub message: ServerMessage,
}

impl Outbound {
    /// Deliver to a single connection
    pub fn unicast(to: ConnectionId, message: ServerMessage) -> Self {
        Self {
            to: vec![to],
            message,
        }
    }

    /// Deliver to an explicit recipient list
    pub fn fanout(to: Vec<ConnectionId>, message: ServerMessage) -> Self {
        Self { to, message }
    }
}
