//! Consumer-group member over one or more topics.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use affinity_core::errors::{AffinityError, AffinityResult, TransportError};
use affinity_core::traits::{IMessageConsumer, LogRecord};

use crate::disconnected;
use crate::log::store::LogStore;
use crate::log::{from_micros, to_micros, topic_partitions};

type Position = (String, u32);

pub struct LogConsumer {
    store: Arc<LogStore>,
    group: String,
    /// Next offset to read per (topic, partition).
    positions: BTreeMap<Position, u64>,
    committed: BTreeMap<Position, u64>,
    /// Partition the next fetch starts from, rotated for fairness.
    cursor: usize,
}

impl LogConsumer {
    pub(crate) fn new(store: Arc<LogStore>, group: &str, topics: &[&str]) -> AffinityResult<Self> {
        let committed = store.with_conn(|conn| load_committed(conn, group, topics))?;
        info!(group, ?topics, partitions = committed.len(), "consumer joined");
        Ok(Self {
            store,
            group: group.to_string(),
            positions: committed.clone(),
            committed,
            cursor: 0,
        })
    }

    /// Current read position of a partition, if subscribed.
    pub fn position(&self, topic: &str, partition: u32) -> Option<u64> {
        self.positions.get(&(topic.to_string(), partition)).copied()
    }

    fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.positions.keys().map(|(t, _)| t.clone()).collect();
        topics.dedup();
        topics
    }
}

fn load_committed(
    conn: &Connection,
    group: &str,
    topics: &[&str],
) -> AffinityResult<BTreeMap<Position, u64>> {
    let mut committed = BTreeMap::new();
    for topic in topics {
        let partitions = topic_partitions(conn, topic)?;
        for partition in 0..partitions {
            let offset: Option<i64> = conn
                .query_row(
                    "SELECT next_offset FROM log_commits
                     WHERE group_id = ?1 AND topic = ?2 AND partition_id = ?3",
                    params![group, topic, partition],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| disconnected(e.to_string()))?;
            committed.insert(
                (topic.to_string(), partition),
                offset.map(|o| o.max(0) as u64).unwrap_or(0),
            );
        }
    }
    Ok(committed)
}

fn fetch_partition(
    conn: &Connection,
    topic: &str,
    partition: u32,
    from: u64,
    limit: usize,
) -> AffinityResult<Vec<LogRecord>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT log_offset, record_key, payload, appended_at FROM log_records
             WHERE topic = ?1 AND partition_id = ?2 AND log_offset >= ?3
             ORDER BY log_offset
             LIMIT ?4",
        )
        .map_err(|e| disconnected(e.to_string()))?;
    let rows = stmt
        .query_map(
            params![topic, partition, from as i64, limit as i64],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .map_err(|e| disconnected(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (offset, key, payload, appended_at) = row.map_err(|e| disconnected(e.to_string()))?;
        records.push(LogRecord {
            topic: topic.to_string(),
            partition,
            offset: offset.max(0) as u64,
            key,
            payload,
            appended_at: from_micros(appended_at)?,
        });
    }
    Ok(records)
}

fn commit_failed(group: &str, e: rusqlite::Error) -> AffinityError {
    TransportError::CommitFailed {
        group: group.to_string(),
        reason: e.to_string(),
    }
    .into()
}

impl IMessageConsumer for LogConsumer {
    fn group(&self) -> &str {
        &self.group
    }

    fn fetch(&mut self, max_records: usize) -> AffinityResult<Vec<LogRecord>> {
        if max_records == 0 || self.positions.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<Position> = self.positions.keys().cloned().collect();
        let start = self.cursor % keys.len();
        self.cursor = self.cursor.wrapping_add(1);

        let positions = &self.positions;
        let batch = self.store.with_conn(|conn| {
            let mut batch = Vec::new();
            for i in 0..keys.len() {
                let remaining = max_records - batch.len();
                if remaining == 0 {
                    break;
                }
                let key = &keys[(start + i) % keys.len()];
                let from = positions.get(key).copied().unwrap_or(0);
                batch.extend(fetch_partition(conn, &key.0, key.1, from, remaining)?);
            }
            Ok(batch)
        })?;

        for record in &batch {
            self.positions
                .insert((record.topic.clone(), record.partition), record.offset + 1);
        }
        if !batch.is_empty() {
            debug!(group = %self.group, count = batch.len(), "fetched records");
        }
        Ok(batch)
    }

    fn commit(&mut self) -> AffinityResult<()> {
        if self.positions == self.committed {
            return Ok(());
        }
        let group = self.group.clone();
        let positions = &self.positions;
        self.store.with_conn(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                .map_err(|e| commit_failed(&group, e))?;
            let now = to_micros(&Utc::now());
            for ((topic, partition), offset) in positions {
                tx.execute(
                    "INSERT INTO log_commits (group_id, topic, partition_id, next_offset, committed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (group_id, topic, partition_id)
                     DO UPDATE SET next_offset = excluded.next_offset,
                                   committed_at = excluded.committed_at",
                    params![group, topic, partition, *offset as i64, now],
                )
                .map_err(|e| commit_failed(&group, e))?;
            }
            tx.commit().map_err(|e| commit_failed(&group, e))
        })?;
        self.committed = self.positions.clone();
        debug!(group = %self.group, "offsets committed");
        Ok(())
    }

    fn rewind(&mut self) -> AffinityResult<()> {
        self.positions = self.committed.clone();
        Ok(())
    }

    fn reconnect(&mut self) -> AffinityResult<()> {
        self.store.reconnect()?;
        let topics = self.topics();
        let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        let committed = self
            .store
            .with_conn(|conn| load_committed(conn, &self.group, &topic_refs))?;
        self.positions = committed.clone();
        self.committed = committed;
        info!(group = %self.group, "consumer resumed from committed offsets");
        Ok(())
    }
}
