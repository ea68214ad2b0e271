//! # affinity-transport
//!
//! A SQLite-backed ordered message log with Kafka-like semantics (topics
//! split into partitions, dense per-partition offsets, consumer groups with
//! durable commits) plus the generic consume-process-commit loop every
//! stream consumer in the system runs on.

pub mod consumer;
pub mod log;
pub mod poll;
pub mod producer;
pub mod runner;

pub use consumer::LogConsumer;
pub use log::MessageLog;
pub use poll::poll;
pub use producer::LogProducer;
pub use runner::{run_consumer_loop, BatchHandler, LoopOptions, LoopStats};

use affinity_core::errors::{AffinityError, TransportError};

pub(crate) fn disconnected(reason: impl Into<String>) -> AffinityError {
    TransportError::Disconnected {
        reason: reason.into(),
    }
    .into()
}

/// Partition for a record key. Stable for negative keys.
pub fn partition_for(key: i64, partitions: u32) -> u32 {
    key.rem_euclid(i64::from(partitions.max(1))) as u32
}
