//! Process-wide NAT mapping state

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, RwLock};

/// Externally visible addressing state of the server
///
/// Created at startup, mutated only by the NAT manager, read by the status
/// reporter. Always well-defined: when every discovery step fails it stays
/// at its all-unknown default instead of holding partial garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatState {
    /// Whether an active port mapping exists on the gateway
    pub enabled: bool,
    /// Externally reachable address, when any discovery step succeeded
    pub public_address: Option<IpAddr>,
    /// Address of the local interface the service binds on
    pub local_address: IpAddr,
    /// Service port (and requested external port)
    pub port: u16,
}

impl Default for NatState {
    fn default() -> Self {
        Self {
            enabled: false,
            public_address: None,
            local_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }
}

impl NatState {
    /// Wrap the state for sharing between the manager and its readers
    pub fn into_shared(self) -> SharedNatState {
        Arc::new(RwLock::new(self))
    }
}

/// Shared handle to the process-wide [`NatState`]
pub type SharedNatState = Arc<RwLock<NatState>>;
