//! Worker actor: ordered application, queries, shutdown on last handle.

use chrono::Utc;

use affinity_aggregator::{AggregatorWorker, SimilarityAggregator};
use affinity_core::config::ActionWeights;
use affinity_core::errors::AffinityError;
use affinity_core::models::{ActionType, InteractionEvent};

fn event(item: i64, user: i64, action: ActionType) -> InteractionEvent {
    InteractionEvent::new(item, user, action, Utc::now())
}

#[tokio::test]
async fn worker_applies_events_in_order() {
    let (handle, join) = AggregatorWorker::spawn(SimilarityAggregator::new(ActionWeights::default()), 8);

    let updates = handle
        .process(vec![
            event(1, 1, ActionType::View),
            event(2, 1, ActionType::Like),
            event(1, 2, ActionType::Like),
            event(2, 2, ActionType::Like),
        ])
        .await
        .unwrap();

    assert_eq!(updates.len(), 2);
    assert!((updates[1].score - 0.8367).abs() < 1e-4);
    assert!((handle.similarity(2, 1).await.unwrap() - 0.8367).abs() < 1e-4);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.items, 2);
    assert_eq!(stats.cached_pairs, 1);

    drop(handle);
    let state = join.await.unwrap();
    assert_eq!(state.weight(1, 1), Some(0.4));
}

#[tokio::test]
async fn clones_share_one_state() {
    let (handle, _join) = AggregatorWorker::spawn(SimilarityAggregator::new(ActionWeights::default()), 1);
    let other = handle.clone();

    handle.process(vec![event(1, 9, ActionType::Like)]).await.unwrap();
    let updates = other.process(vec![event(2, 9, ActionType::Like)]).await.unwrap();
    assert_eq!(updates.len(), 1);
    assert!((updates[0].score - 1.0).abs() < 1e-12);
}

#[tokio::test]
async fn stopped_worker_reports_worker_stopped() {
    let (handle, join) = AggregatorWorker::spawn(SimilarityAggregator::new(ActionWeights::default()), 1);
    join.abort();
    let _ = join.await;

    let err = handle.stats().await.unwrap_err();
    assert!(matches!(err, AffinityError::AggregatorError(_)));
}
