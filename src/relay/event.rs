//! Client-to-server relay events
//!
//! The transport decodes each framed message into one of these before handing
//! it to the relay. Event names and payload layout follow the wire protocol.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Event received from a client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Begin publishing audio chunks
    StartStream,
    /// Subscribe to the listener group
    JoinStream,
    /// One opaque binary audio payload (never inspected, cheap to clone)
    AudioChunk(Bytes),
    /// Stop publishing
    StopStream,
    /// Leave the listener group
    StopListening,
    /// Request a status snapshot
    GetStatus,
}
