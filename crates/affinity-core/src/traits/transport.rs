use chrono::{DateTime, Utc};

use crate::errors::AffinityResult;

/// One record read from the message log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: i64,
    pub payload: String,
    pub appended_at: DateTime<Utc>,
}

/// Where an appended record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: u32,
    pub offset: u64,
}

/// A consumer-group member reading one or more topics.
///
/// Records within a partition are returned in offset order. Positions move
/// forward on `fetch` and only become durable on `commit`.
pub trait IMessageConsumer: Send {
    fn group(&self) -> &str;

    /// Return up to `max_records` available records without waiting.
    fn fetch(&mut self, max_records: usize) -> AffinityResult<Vec<LogRecord>>;

    /// Durably record the current positions for the group.
    fn commit(&mut self) -> AffinityResult<()>;

    /// Move positions back to the last committed offsets so the uncommitted
    /// records are delivered again.
    fn rewind(&mut self) -> AffinityResult<()>;

    /// Re-establish the connection and resume from the last committed offsets.
    fn reconnect(&mut self) -> AffinityResult<()>;
}

/// Appends records to topics. A successful return means the record is durable.
pub trait IMessageProducer: Send + Sync {
    fn send(&self, topic: &str, key: i64, payload: &str) -> AffinityResult<Delivery>;

    /// Append several records atomically: all of them or none.
    fn send_batch(&self, topic: &str, records: &[(i64, String)]) -> AffinityResult<Vec<Delivery>>;
}
