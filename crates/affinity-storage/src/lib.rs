//! # affinity-storage
//!
//! SQLite persistence layer for the analyzer: one serialized write connection,
//! a round-robin read pool, versioned migrations, idempotent upserts for
//! `user_actions` and `event_similarities`, and the read queries the
//! recommendation engine needs.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod transaction;

pub use engine::{StorageEngine, StoreStats};

use affinity_core::errors::{AffinityError, StorageError};

/// Wrap a driver error message as an `AffinityError::StorageError`.
pub(crate) fn to_storage_err(message: String) -> AffinityError {
    StorageError::SqliteError { message }.into()
}
