//! Server status snapshots

use std::sync::PoisonError;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::nat::SharedNatState;
use crate::registry::RegistryCounts;

/// Point-in-time view of the server, shaped for the status JSON contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSnapshot {
    /// Always `"running"` while the process answers at all
    pub status: String,
    pub streamer_count: usize,
    pub listener_count: usize,
    pub uptime_seconds: u64,
    pub nat_enabled: bool,
    /// Externally reachable address, when discovery succeeded
    pub public_address: Option<String>,
    pub local_address: String,
    pub port: u16,
    pub version: String,
}

/// Assembles status snapshots from registry counts and NAT state
///
/// Pure read: safe to call concurrently with any relay operation. Cheap to
/// clone, all clones share the same NAT state handle and start time.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    started_at: Instant,
    nat: SharedNatState,
}

impl StatusReporter {
    /// Create a reporter; uptime counts from this call
    pub fn new(nat: SharedNatState) -> Self {
        Self {
            started_at: Instant::now(),
            nat,
        }
    }

    /// Time since the reporter was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Assemble a snapshot for the given registry counts
    pub fn snapshot(&self, counts: RegistryCounts) -> ServerSnapshot {
        let nat = self
            .nat
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        ServerSnapshot {
            status: "running".to_string(),
            streamer_count: counts.streamers,
            listener_count: counts.listeners,
            uptime_seconds: self.uptime().as_secs(),
            nat_enabled: nat.enabled,
            public_address: nat.public_address.map(|address| address.to_string()),
            local_address: nat.local_address.to_string(),
            port: nat.port,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
