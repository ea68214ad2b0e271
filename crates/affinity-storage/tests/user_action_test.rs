//! user_actions: max-merge upserts, recency ordering, per-item sums.

use chrono::{DateTime, Duration, TimeZone, Utc};

use affinity_core::models::UserAction;
use affinity_core::traits::{IActionStorage, UpsertOutcome};
use affinity_storage::StorageEngine;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn action(event_id: i64, user_id: i64, calc: f64, minutes: i64) -> UserAction {
    UserAction {
        event_id,
        user_id,
        calc,
        timestamp: t0() + Duration::minutes(minutes),
    }
}

#[test]
fn upsert_inserts_then_raises_only_on_larger_weight() {
    let storage = StorageEngine::open_in_memory().unwrap();

    let outcomes = storage.upsert_user_actions(&[action(1, 7, 0.4, 0)]).unwrap();
    assert_eq!(outcomes, vec![UpsertOutcome::Inserted]);

    let outcomes = storage.upsert_user_actions(&[action(1, 7, 1.0, 5)]).unwrap();
    assert_eq!(outcomes, vec![UpsertOutcome::Updated]);

    // Lower weight later in time: neither calc nor timestamp move.
    let outcomes = storage.upsert_user_actions(&[action(1, 7, 0.8, 10)]).unwrap();
    assert_eq!(outcomes, vec![UpsertOutcome::Unchanged]);

    let row = storage.get_user_action(1, 7).unwrap().unwrap();
    assert_eq!(row.calc, 1.0);
    assert_eq!(row.timestamp, t0() + Duration::minutes(5));
}

#[test]
fn replaying_a_batch_changes_nothing() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let batch = vec![action(1, 7, 0.4, 0), action(2, 7, 0.8, 1), action(1, 8, 1.0, 2)];

    storage.upsert_user_actions(&batch).unwrap();
    let replay = storage.upsert_user_actions(&batch).unwrap();

    assert!(replay.iter().all(|o| *o == UpsertOutcome::Unchanged));
    assert_eq!(storage.stats().unwrap().user_actions, 3);
}

#[test]
fn same_pair_twice_in_one_batch_keeps_the_max() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let outcomes = storage
        .upsert_user_actions(&[action(3, 9, 1.0, 0), action(3, 9, 0.4, 1)])
        .unwrap();

    assert_eq!(outcomes, vec![UpsertOutcome::Inserted, UpsertOutcome::Unchanged]);
    assert_eq!(storage.get_user_action(3, 9).unwrap().unwrap().calc, 1.0);
}

#[test]
fn recent_actions_are_newest_first_and_limited() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage
        .upsert_user_actions(&[
            action(10, 1, 0.4, 0),
            action(11, 1, 0.4, 30),
            action(12, 1, 0.4, 10),
            action(13, 2, 0.4, 60),
        ])
        .unwrap();

    let recent = storage.recent_user_actions(1, 2).unwrap();
    let ids: Vec<i64> = recent.iter().map(|a| a.event_id).collect();
    assert_eq!(ids, vec![11, 12]);

    assert!(storage.recent_user_actions(1, 0).unwrap().is_empty());
    assert!(storage.recent_user_actions(99, 5).unwrap().is_empty());
}

#[test]
fn interacted_items_cover_every_row_of_the_user() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage
        .upsert_user_actions(&[action(1, 5, 0.4, 0), action(2, 5, 1.0, 1), action(3, 6, 0.4, 2)])
        .unwrap();

    let items = storage.interacted_items(5).unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.contains(&1) && items.contains(&2));
}

#[test]
fn interaction_sums_add_calc_across_users() {
    let storage = StorageEngine::open_in_memory().unwrap();
    storage
        .upsert_user_actions(&[action(1, 5, 0.4, 0), action(1, 6, 1.0, 1), action(2, 6, 0.8, 2)])
        .unwrap();

    let sums = storage.interaction_sums(&[1, 2, 3, 1]).unwrap();
    assert!((sums[&1] - 1.4).abs() < 1e-9);
    assert!((sums[&2] - 0.8).abs() < 1e-9);
    assert!(!sums.contains_key(&3));
    assert!(storage.interaction_sums(&[]).unwrap().is_empty());
}

#[test]
fn interaction_sums_handle_lists_longer_than_one_chunk() {
    let storage = StorageEngine::open_in_memory().unwrap();
    let rows: Vec<UserAction> = (0..1200).map(|i| action(i, 1, 0.4, 0)).collect();
    storage.upsert_user_actions(&rows).unwrap();

    let ids: Vec<i64> = (0..1200).collect();
    let sums = storage.interaction_sums(&ids).unwrap();
    assert_eq!(sums.len(), 1200);
}
