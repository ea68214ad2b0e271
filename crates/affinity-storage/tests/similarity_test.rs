//! event_similarities: canonical keys, last-write-wins, neighbor lookups.

use chrono::{Duration, TimeZone, Utc};

use affinity_core::models::EventSimilarity;
use affinity_core::traits::{ISimilarityStorage, UpsertOutcome};
use affinity_storage::StorageEngine;

fn sim(a: i64, b: i64, score: f64) -> EventSimilarity {
    EventSimilarity {
        event_a: a,
        event_b: b,
        score,
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn latest_score_replaces_the_stored_one() {
    let storage = StorageEngine::open_in_memory().unwrap();
    assert_eq!(
        storage.upsert_similarities(&[sim(1, 2, 0.5)]).unwrap(),
        vec![UpsertOutcome::Inserted]
    );

    let mut lower = sim(1, 2, 0.3);
    lower.timestamp += Duration::seconds(1);
    assert_eq!(
        storage.upsert_similarities(&[lower]).unwrap(),
        vec![UpsertOutcome::Updated]
    );

    let row = storage.get_similarity(2, 1).unwrap().unwrap();
    assert_eq!((row.event_a, row.event_b), (1, 2));
    assert_eq!(row.score, 0.3);
}

#[test]
fn identical_replay_is_unchanged() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage.upsert_similarities(&[sim(1, 2, 0.5)]).unwrap();
    assert_eq!(
        storage.upsert_similarities(&[sim(1, 2, 0.5)]).unwrap(),
        vec![UpsertOutcome::Unchanged]
    );
    assert_eq!(storage.stats().unwrap().similarities, 1);
}

#[test]
fn non_canonical_row_is_rejected_and_batch_rolls_back() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let result = storage.upsert_similarities(&[sim(1, 2, 0.5), sim(4, 3, 0.9)]);

    assert!(result.is_err());
    assert!(storage.get_similarity(1, 2).unwrap().is_none());
}

#[test]
fn similarities_for_returns_both_orientations_by_score() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage
        .upsert_similarities(&[sim(1, 5, 0.2), sim(5, 9, 0.7), sim(2, 3, 0.9)])
        .unwrap();

    let rows = storage.similarities_for(5).unwrap();
    let neighbors: Vec<i64> = rows.iter().map(|r| r.neighbor_of(5)).collect();
    assert_eq!(neighbors, vec![9, 1]);
}

#[test]
fn similarities_touching_lists_each_row_once() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage
        .upsert_similarities(&[sim(1, 2, 0.4), sim(2, 3, 0.6), sim(7, 8, 0.9)])
        .unwrap();

    let rows = storage.similarities_touching(&[1, 2, 2]).unwrap();
    let pairs: Vec<(i64, i64)> = rows.iter().map(|r| (r.event_a, r.event_b)).collect();
    assert_eq!(pairs, vec![(2, 3), (1, 2)]);
    assert!(storage.similarities_touching(&[]).unwrap().is_empty());
}
