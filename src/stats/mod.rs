//! Status reporting
//!
//! Read-only snapshot assembly for the `get-status` relay event and the
//! embedding HTTP layer's `GET /status`. Snapshots are assembled from live
//! registry counts and the shared NAT state on every call; nothing is cached.

pub mod snapshot;

pub use snapshot::{ServerSnapshot, StatusReporter};
