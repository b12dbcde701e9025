//! Real-time audio relay
//!
//! One streamer connection pushes opaque binary audio chunks; the relay fans
//! them out to every subscribed listener with minimal added latency, and a
//! NAT traversal manager publishes the server's address for clients behind
//! NAT.
//!
//! The crate is transport-agnostic. The embedding application owns the
//! message transport and the HTTP status surface: it decodes framed messages
//! into [`ClientEvent`]s, feeds them to a [`RelayService`], and delivers the
//! returned [`Outbound`] notifications to their recipients.
//!
//! ```text
//!   transport events ──► RelayService ──► RelayRouter ──► SessionRegistry
//!                            │                 │
//!                            │                 └──► Vec<Outbound> back to
//!                            │                      the transport
//!                            └──► StatusReporter ◄── NatManager (own task)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use audiocast_rs::{ClientEvent, NatConfig, NatManager, RelayService, StatusReporter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let nat = NatManager::new(NatConfig::for_port(3000));
//!     let status = StatusReporter::new(nat.state());
//!
//!     // NAT negotiation runs off the relay's critical path
//!     tokio::spawn(nat.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }));
//!
//!     let relay = RelayService::new(status);
//!     relay.client_connected(7.into());
//!     for out in relay.handle_event(7.into(), ClientEvent::JoinStream) {
//!         // hand out.message to every connection in out.to
//!         println!("deliver to {} connection(s)", out.to.len());
//!     }
//! }
//! ```

pub mod nat;
pub mod registry;
pub mod relay;
pub mod stats;

pub use nat::{NatConfig, NatError, NatManager, NatState, SharedNatState};
pub use registry::{ConnectionId, RegistryCounts, Role, SessionRegistry};
pub use relay::{ClientEvent, Outbound, RelayRouter, RelayService, ServerMessage, StopReason};
pub use stats::{ServerSnapshot, StatusReporter};
