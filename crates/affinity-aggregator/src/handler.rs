//! Stream side of the aggregator: decode inbound records, apply them through
//! the worker, publish the resulting updates.

use affinity_core::errors::AffinityResult;
use affinity_core::models::{InteractionEvent, SimilarityMessage, SimilarityUpdate, UserActionMessage};
use affinity_core::traits::{IMessageConsumer, IMessageProducer, LogRecord};
use affinity_transport::{BatchHandler, LogConsumer, MessageLog};
use affinity_observability::aggregation_span;
use tracing::{debug, info, warn, Instrument};

use crate::worker::AggregatorHandle;

/// Batch handler for the user-actions topic.
///
/// Updates are keyed by `eventA`, so every update of one pair lands on the
/// same partition and is persisted in emission order. Updates that fail to
/// publish stay buffered and go out ahead of the next batch's: their events
/// are already absorbed by the state and would produce nothing on replay.
/// Publishing appends to the local log inline, like the runner's commit.
pub struct AggregationHandler<P> {
    aggregator: AggregatorHandle,
    producer: P,
    topic: String,
    pending: Vec<SimilarityUpdate>,
}

impl<P: IMessageProducer> AggregationHandler<P> {
    pub fn new(aggregator: AggregatorHandle, producer: P, topic: impl Into<String>) -> Self {
        Self {
            aggregator,
            producer,
            topic: topic.into(),
            pending: Vec::new(),
        }
    }

    /// Updates computed but not yet published.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn publish_pending(&mut self) -> AffinityResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let records = self
            .pending
            .iter()
            .map(|update| Ok((update.event_a, SimilarityMessage::encode(update)?)))
            .collect::<AffinityResult<Vec<_>>>()?;
        self.producer.send_batch(&self.topic, &records)?;
        debug!(topic = %self.topic, count = records.len(), "similarity updates published");
        self.pending.clear();
        Ok(())
    }
}

/// Decode a batch, dropping records that do not parse.
pub(crate) fn decode_events(records: &[LogRecord]) -> Vec<InteractionEvent> {
    records
        .iter()
        .filter_map(|record| match UserActionMessage::decode(&record.payload) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "dropping malformed user action"
                );
                None
            }
        })
        .collect()
}

impl<P: IMessageProducer> BatchHandler for AggregationHandler<P> {
    async fn handle_batch(&mut self, records: &[LogRecord]) -> AffinityResult<()> {
        let span = aggregation_span!(records.len());
        async {
            let events = decode_events(records);
            if !events.is_empty() {
                let updates = self.aggregator.process(events).await?;
                self.pending.extend(updates);
            }
            self.publish_pending()
        }
        .instrument(span)
        .await
    }
}

/// Rebuild worker state after a restart by applying every record the
/// aggregator group has already committed, without publishing anything.
///
/// Reads through a separate group that never commits, so it always starts
/// from the beginning of the topic. Returns the number of events applied.
pub async fn replay_committed(
    log: &MessageLog,
    aggregator: &AggregatorHandle,
    group: &str,
    topic: &str,
    max_records: usize,
) -> AffinityResult<u64> {
    let partitions = log.partitions(topic)?;
    let mut targets = Vec::with_capacity(partitions as usize);
    for partition in 0..partitions {
        targets.push(log.committed_offset(group, topic, partition)?.unwrap_or(0));
    }
    if targets.iter().all(|t| *t == 0) {
        return Ok(0);
    }

    let mut replay = log.consumer(&format!("{group}.replay"), &[topic])?;
    let mut applied = 0u64;
    let behind = |replay: &LogConsumer| {
        targets
            .iter()
            .enumerate()
            .any(|(p, target)| replay.position(topic, p as u32).unwrap_or(0) < *target)
    };
    while behind(&replay) {
        let records = replay.fetch(max_records)?;
        if records.is_empty() {
            break;
        }
        let committed: Vec<LogRecord> = records
            .into_iter()
            .filter(|r| r.offset < targets.get(r.partition as usize).copied().unwrap_or(0))
            .collect();
        let events = decode_events(&committed);
        applied += events.len() as u64;
        if !events.is_empty() {
            aggregator.process(events).await?;
        }
    }
    info!(group, topic, applied, "aggregator state rebuilt from committed records");
    Ok(applied)
}
