//! Aggregation handler: decode, publish, buffer on publish failure, replay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use affinity_aggregator::{replay_committed, AggregationHandler, AggregatorWorker, SimilarityAggregator};
use affinity_core::config::ActionWeights;
use affinity_core::errors::{AffinityResult, TransportError};
use affinity_core::models::{ActionType, InteractionEvent, SimilarityMessage, UserActionMessage};
use affinity_core::traits::{Delivery, IMessageConsumer, IMessageProducer, LogRecord};
use affinity_transport::{BatchHandler, LogProducer, MessageLog};

const ACTIONS: &str = "stats.user-actions.v1";
const SIMILARITY: &str = "stats.events-similarity.v1";

fn log() -> MessageLog {
    let log = MessageLog::open_in_memory().unwrap();
    log.create_topic(ACTIONS, 2).unwrap();
    log.create_topic(SIMILARITY, 2).unwrap();
    log
}

fn append(log: &MessageLog, item: i64, user: i64, action: ActionType) {
    let payload =
        UserActionMessage::encode(&InteractionEvent::new(item, user, action, Utc::now())).unwrap();
    log.producer().send(ACTIONS, item, &payload).unwrap();
}

fn spawn_worker() -> affinity_aggregator::AggregatorHandle {
    AggregatorWorker::spawn(SimilarityAggregator::new(ActionWeights::default()), 16).0
}

fn drain(log: &MessageLog, group: &str, topic: &str) -> Vec<LogRecord> {
    let mut consumer = log.consumer(group, &[topic]).unwrap();
    consumer.fetch(1000).unwrap()
}

#[tokio::test]
async fn publishes_updates_keyed_by_event_a() {
    let log = log();
    append(&log, 1, 1, ActionType::Like);
    append(&log, 2, 1, ActionType::Like);
    append(&log, 3, 1, ActionType::View);
    let mut handler = AggregationHandler::new(spawn_worker(), log.producer(), SIMILARITY);

    let records = drain(&log, "agg", ACTIONS);
    handler.handle_batch(&records).await.unwrap();

    let published = drain(&log, "check", SIMILARITY);
    assert!(!published.is_empty());
    for record in &published {
        let update = SimilarityMessage::decode(&record.payload).unwrap();
        assert_eq!(record.key, update.event_a);
        assert!(update.event_a < update.event_b);
    }
    assert_eq!(handler.pending(), 0);
}

#[tokio::test]
async fn malformed_records_are_dropped() {
    let log = log();
    log.producer().send(ACTIONS, 1, "{not json").unwrap();
    log.producer()
        .send(
            ACTIONS,
            1,
            r#"{"userId":1,"eventId":1,"actionType":"SHARE","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
    let mut handler = AggregationHandler::new(spawn_worker(), log.producer(), SIMILARITY);

    let records = drain(&log, "agg", ACTIONS);
    handler.handle_batch(&records).await.unwrap();
    assert!(drain(&log, "check", SIMILARITY).is_empty());
}

/// Producer that fails while `down` is set.
struct FlakyProducer {
    inner: LogProducer,
    down: Arc<AtomicBool>,
}

impl IMessageProducer for FlakyProducer {
    fn send(&self, topic: &str, key: i64, payload: &str) -> AffinityResult<Delivery> {
        self.send_batch(topic, &[(key, payload.to_string())])
            .map(|mut d| d.remove(0))
    }

    fn send_batch(&self, topic: &str, records: &[(i64, String)]) -> AffinityResult<Vec<Delivery>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(TransportError::ProduceFailed {
                topic: topic.to_string(),
                reason: "unreachable".into(),
            }
            .into());
        }
        self.inner.send_batch(topic, records)
    }
}

#[tokio::test]
async fn failed_publish_is_retried_with_the_replayed_batch() {
    let log = log();
    append(&log, 1, 1, ActionType::Like);
    append(&log, 2, 1, ActionType::Like);
    let down = Arc::new(AtomicBool::new(true));
    let producer = FlakyProducer {
        inner: log.producer(),
        down: Arc::clone(&down),
    };
    let mut handler = AggregationHandler::new(spawn_worker(), producer, SIMILARITY);
    let records = drain(&log, "agg", ACTIONS);

    let err = handler.handle_batch(&records).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(handler.pending(), 1);

    // Redelivery yields no new updates; the buffered one is published.
    down.store(false, Ordering::SeqCst);
    handler.handle_batch(&records).await.unwrap();
    assert_eq!(handler.pending(), 0);
    assert_eq!(drain(&log, "check", SIMILARITY).len(), 1);
}

#[tokio::test]
async fn replay_rebuilds_state_up_to_committed_offsets() {
    let log = log();
    append(&log, 1, 1, ActionType::Like);
    append(&log, 2, 1, ActionType::Like);
    let mut consumer = log.consumer("agg", &[ACTIONS]).unwrap();
    assert_eq!(consumer.fetch(100).unwrap().len(), 2);
    consumer.commit().unwrap();
    append(&log, 3, 1, ActionType::Like);

    let handle = spawn_worker();
    let applied = replay_committed(&log, &handle, "agg", ACTIONS, 100).await.unwrap();

    assert_eq!(applied, 2);
    assert!((handle.similarity(1, 2).await.unwrap() - 1.0).abs() < 1e-12);
    assert_eq!(handle.similarity(1, 3).await.unwrap(), 0.0);
    assert!(drain(&log, "check", SIMILARITY).is_empty());
}

#[tokio::test]
async fn replay_with_nothing_committed_is_empty() {
    let log = log();
    append(&log, 1, 1, ActionType::Like);
    let handle = spawn_worker();
    assert_eq!(replay_committed(&log, &handle, "agg", ACTIONS, 100).await.unwrap(), 0);
}
