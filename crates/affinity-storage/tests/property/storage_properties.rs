//! Property tests: max-merge upserts are order-insensitive and replay-safe.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use affinity_core::models::UserAction;
use affinity_core::traits::{IActionStorage, UpsertOutcome};
use affinity_storage::StorageEngine;

const WEIGHTS: [f64; 3] = [0.4, 0.8, 1.0];

fn rows_strategy() -> impl Strategy<Value = Vec<(i64, i64, usize)>> {
    prop::collection::vec((0i64..6, 0i64..4, 0usize..3), 1..40)
}

fn to_actions(rows: &[(i64, i64, usize)]) -> Vec<UserAction> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, (event_id, user_id, w))| UserAction {
            event_id: *event_id,
            user_id: *user_id,
            calc: WEIGHTS[*w],
            timestamp: base + Duration::seconds(i as i64),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_stored_calc_is_max_of_observed(rows in rows_strategy()) {
        let storage = StorageEngine::open_in_memory().unwrap();
        let actions = to_actions(&rows);
        storage.upsert_user_actions(&actions).unwrap();

        for a in &actions {
            let expected = actions
                .iter()
                .filter(|b| b.event_id == a.event_id && b.user_id == a.user_id)
                .map(|b| b.calc)
                .fold(f64::MIN, f64::max);
            let stored = storage.get_user_action(a.event_id, a.user_id).unwrap().unwrap();
            prop_assert_eq!(stored.calc, expected);
        }
    }

    #[test]
    fn prop_replay_is_a_no_op(rows in rows_strategy()) {
        let storage = StorageEngine::open_in_memory().unwrap();
        let actions = to_actions(&rows);
        storage.upsert_user_actions(&actions).unwrap();

        let replay = storage.upsert_user_actions(&actions).unwrap();
        prop_assert!(replay.iter().all(|o| *o == UpsertOutcome::Unchanged));
    }

    #[test]
    fn prop_arrival_order_does_not_change_calc(rows in rows_strategy()) {
        let forward = StorageEngine::open_in_memory().unwrap();
        let backward = StorageEngine::open_in_memory().unwrap();
        let actions = to_actions(&rows);
        let mut reversed = actions.clone();
        reversed.reverse();

        forward.upsert_user_actions(&actions).unwrap();
        backward.upsert_user_actions(&reversed).unwrap();

        for a in &actions {
            let f = forward.get_user_action(a.event_id, a.user_id).unwrap().unwrap();
            let b = backward.get_user_action(a.event_id, a.user_id).unwrap().unwrap();
            prop_assert_eq!(f.calc, b.calc);
        }
    }
}
