//! Appends records. Every call is its own immediate transaction, so a
//! returned `Delivery` is durable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tracing::debug;

use affinity_core::errors::{AffinityError, AffinityResult, TransportError};
use affinity_core::traits::{Delivery, IMessageProducer};

use crate::log::store::LogStore;
use crate::log::{next_offset, to_micros, topic_partitions};
use crate::partition_for;

#[derive(Clone)]
pub struct LogProducer {
    store: Arc<LogStore>,
}

impl LogProducer {
    pub(crate) fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    fn append(&self, topic: &str, records: &[(i64, &str)]) -> AffinityResult<Vec<Delivery>> {
        self.store.with_conn(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                .map_err(|e| produce_failed(topic, e))?;
            let deliveries = append_all(&tx, topic, records)?;
            tx.commit().map_err(|e| produce_failed(topic, e))?;
            Ok(deliveries)
        })
    }
}

fn append_all(
    conn: &Connection,
    topic: &str,
    records: &[(i64, &str)],
) -> AffinityResult<Vec<Delivery>> {
    let partitions = topic_partitions(conn, topic)?;
    let appended_at = to_micros(&Utc::now());
    let mut next: HashMap<u32, u64> = HashMap::new();
    let mut deliveries = Vec::with_capacity(records.len());

    for (key, payload) in records {
        let partition = partition_for(*key, partitions);
        let offset = match next.get(&partition) {
            Some(offset) => *offset,
            None => next_offset(conn, topic, partition)?,
        };
        conn.execute(
            "INSERT INTO log_records
                (topic, partition_id, log_offset, record_key, payload, appended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![topic, partition, offset as i64, key, payload, appended_at],
        )
        .map_err(|e| produce_failed(topic, e))?;
        next.insert(partition, offset + 1);
        deliveries.push(Delivery { partition, offset });
    }
    debug!(topic, count = deliveries.len(), "appended records");
    Ok(deliveries)
}

fn produce_failed(topic: &str, e: rusqlite::Error) -> AffinityError {
    TransportError::ProduceFailed {
        topic: topic.to_string(),
        reason: e.to_string(),
    }
    .into()
}

impl IMessageProducer for LogProducer {
    fn send(&self, topic: &str, key: i64, payload: &str) -> AffinityResult<Delivery> {
        let mut deliveries = self.append(topic, &[(key, payload)])?;
        deliveries.pop().ok_or_else(|| {
            TransportError::ProduceFailed {
                topic: topic.to_string(),
                reason: "no delivery returned".to_string(),
            }
            .into()
        })
    }

    fn send_batch(&self, topic: &str, records: &[(i64, String)]) -> AffinityResult<Vec<Delivery>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let borrowed: Vec<(i64, &str)> = records.iter().map(|(k, p)| (*k, p.as_str())).collect();
        self.append(topic, &borrowed)
    }
}
