//! Session registry for role tracking
//!
//! The registry is the authoritative record of which connections are currently
//! streaming and which are listening. It is a plain data structure: marking a
//! role has no side effects beyond the mutation itself, and notifying peers is
//! the relay router's job. Keeping it pure lets the role transition table be
//! unit tested without a live transport.
//!
//! # Architecture
//!
//! ```text
//!                    SessionRegistry
//!               ┌──────────────────────┐
//!               │ roles: HashMap<      │
//!               │   ConnectionId,      │
//!               │   Role,              │
//!               │ >                    │
//!               └──────────┬───────────┘
//!                          │
//!        ┌─────────────────┼─────────────────┐
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//!   [RelayRouter]    [RelayRouter]    [StatusReporter]
//!   is_streamer()    listener fanout  counts()
//! ```
//!
//! # Role exclusivity
//!
//! A connection holds at most one role. Storing a single [`Role`] per
//! connection (instead of two independent sets) makes that a structural
//! invariant: marking a listener as streamer replaces its role, it cannot
//! end up in both groups.

pub mod connection;
pub mod role;
pub mod store;

pub use connection::ConnectionId;
pub use role::Role;
pub use store::{RegistryCounts, SessionRegistry};
