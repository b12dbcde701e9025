//! NAT traversal
//!
//! Makes the relay reachable from outside the local network, best-effort:
//!
//! 1. pick a local address (first routable IPv4 interface, else loopback)
//! 2. discover the UPnP gateway and ask it for the external address
//! 3. request a port mapping with a finite lease
//! 4. if the gateway path failed, ask a public external-IP lookup service
//!
//! Every step carries its own timeout and failure only advances the chain;
//! the relay never waits on any of this. The resulting [`NatState`] is a
//! process-wide singleton read by the status reporter and torn down
//! (mapping only, best-effort, bounded) on shutdown.
//!
//! Gateway and lookup backends sit behind the [`PortMapper`] and [`IpLookup`]
//! traits so the fallback sequencing can be exercised without a gateway on
//! the network.

pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod mapper;
pub mod state;

pub use config::NatConfig;
pub use discovery::{HttpIpLookup, IpLookup};
pub use error::NatError;
pub use manager::NatManager;
pub use mapper::{MappingRequest, PortMapper, UpnpMapper};
pub use state::{NatState, SharedNatState};
