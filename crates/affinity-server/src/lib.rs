//! # affinity-server
//!
//! Process wiring for the `affinity` binary: the HTTP surfaces (collector
//! ingestion and the query RPC) and the roles that run the stream loops.

pub mod api;
pub mod roles;
pub mod shutdown;

pub use shutdown::Shutdown;
