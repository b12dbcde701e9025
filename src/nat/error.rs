//! NAT traversal error types
//!
//! All of these are recoverable by the manager's fallback chain; none are
//! ever fatal to the process.

/// Error type for NAT traversal operations
#[derive(Debug, Clone)]
pub enum NatError {
    /// No gateway has been discovered on this network
    GatewayUnavailable,
    /// Gateway search or external-address query failed
    Gateway(String),
    /// The gateway rejected a mapping request
    Mapping(String),
    /// The external-IP lookup service was unreachable or answered garbage
    Lookup(String),
}

impl std::fmt::Display for NatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NatError::GatewayUnavailable => write!(f, "No UPnP gateway available"),
            NatError::Gateway(reason) => write!(f, "Gateway error: {}", reason),
            NatError::Mapping(reason) => write!(f, "Port mapping error: {}", reason),
            NatError::Lookup(reason) => write!(f, "External IP lookup error: {}", reason),
        }
    }
}

impl std::error::Error for NatError {}
