//! `MessageLog`: topic registry and entry point for producers and consumers.

mod schema;
pub(crate) mod store;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use affinity_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use affinity_core::config::TransportConfig;
use affinity_core::errors::{AffinityResult, TransportError};

use crate::consumer::LogConsumer;
use crate::disconnected;
use crate::producer::LogProducer;
use store::LogStore;

/// Handle to one log database. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<LogStore>,
}

impl MessageLog {
    pub fn open(path: &Path) -> AffinityResult<Self> {
        Ok(Self {
            store: Arc::new(LogStore::open(path, DEFAULT_BUSY_TIMEOUT_MS)?),
        })
    }

    pub fn open_in_memory() -> AffinityResult<Self> {
        Ok(Self {
            store: Arc::new(LogStore::open_in_memory()?),
        })
    }

    /// Open the configured log and make sure both topics exist.
    pub fn open_with_config(config: &TransportConfig) -> AffinityResult<Self> {
        let log = Self::open(Path::new(&config.log_path))?;
        log.create_topic(&config.user_actions_topic, config.partitions)?;
        log.create_topic(&config.similarity_topic, config.partitions)?;
        Ok(log)
    }

    /// Register `topic`. An existing topic keeps its partition count, which
    /// is returned.
    pub fn create_topic(&self, topic: &str, partitions: u32) -> AffinityResult<u32> {
        let partitions = partitions.max(1);
        self.store.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO log_topics (topic, partitions) VALUES (?1, ?2)",
                params![topic, partitions],
            )
            .map_err(|e| disconnected(e.to_string()))?;
            let actual = topic_partitions(conn, topic)?;
            if actual != partitions {
                warn!(topic, requested = partitions, actual, "topic exists with a different partition count");
            } else {
                info!(topic, partitions, "topic ready");
            }
            Ok(actual)
        })
    }

    pub fn partitions(&self, topic: &str) -> AffinityResult<u32> {
        self.store.with_conn(|conn| topic_partitions(conn, topic))
    }

    pub fn producer(&self) -> LogProducer {
        LogProducer::new(Arc::clone(&self.store))
    }

    /// Join `group` on `topics`, positioned at the group's committed offsets.
    pub fn consumer(&self, group: &str, topics: &[&str]) -> AffinityResult<LogConsumer> {
        LogConsumer::new(Arc::clone(&self.store), group, topics)
    }

    /// Offset the next appended record of the partition will get.
    pub fn end_offset(&self, topic: &str, partition: u32) -> AffinityResult<u64> {
        self.store
            .with_conn(|conn| next_offset(conn, topic, partition))
    }

    pub fn committed_offset(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
    ) -> AffinityResult<Option<u64>> {
        self.store.with_conn(|conn| {
            conn.query_row(
                "SELECT next_offset FROM log_commits
                 WHERE group_id = ?1 AND topic = ?2 AND partition_id = ?3",
                params![group, topic, partition],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|o| o.map(|v| v.max(0) as u64))
            .map_err(|e| disconnected(e.to_string()))
        })
    }

    /// Records appended but not yet committed by `group`, across partitions.
    pub fn lag(&self, group: &str, topic: &str) -> AffinityResult<u64> {
        let partitions = self.partitions(topic)?;
        let mut lag = 0;
        for partition in 0..partitions {
            let end = self.end_offset(topic, partition)?;
            let committed = self.committed_offset(group, topic, partition)?.unwrap_or(0);
            lag += end.saturating_sub(committed);
        }
        Ok(lag)
    }
}

pub(crate) fn topic_partitions(conn: &Connection, topic: &str) -> AffinityResult<u32> {
    conn.query_row(
        "SELECT partitions FROM log_topics WHERE topic = ?1",
        params![topic],
        |row| row.get::<_, u32>(0),
    )
    .optional()
    .map_err(|e| disconnected(e.to_string()))?
    .ok_or_else(|| {
        TransportError::UnknownTopic {
            topic: topic.to_string(),
        }
        .into()
    })
}

pub(crate) fn next_offset(conn: &Connection, topic: &str, partition: u32) -> AffinityResult<u64> {
    conn.query_row(
        "SELECT COALESCE(MAX(log_offset) + 1, 0) FROM log_records
         WHERE topic = ?1 AND partition_id = ?2",
        params![topic, partition],
        |row| row.get::<_, i64>(0),
    )
    .map(|v| v.max(0) as u64)
    .map_err(|e| disconnected(e.to_string()))
}

pub(crate) fn to_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> AffinityResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| disconnected(format!("corrupt log timestamp {micros}")))
}
