//! Property tests: recommendations never include the user's own history;
//! persisting is idempotent under replay.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use affinity_analyzer::{InteractionPersister, RecommendationEngine};
use affinity_core::config::ActionWeights;
use affinity_core::models::{ActionType, EventSimilarity, InteractionEvent};
use affinity_core::traits::{IActionStorage, ISimilarityStorage, UpsertOutcome};
use affinity_storage::StorageEngine;

fn action_type(i: u8) -> ActionType {
    match i % 3 {
        0 => ActionType::View,
        1 => ActionType::Register,
        _ => ActionType::Like,
    }
}

fn events(raw: &[(i64, i64, u8)]) -> Vec<InteractionEvent> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    raw.iter()
        .enumerate()
        .map(|(i, (item, user, a))| {
            InteractionEvent::new(*item, *user, action_type(*a), base + Duration::seconds(i as i64))
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_recommendations_exclude_history(
        raw in prop::collection::vec((0i64..12, 0i64..4, 0u8..3), 1..40),
        pairs in prop::collection::vec((0i64..12, 0i64..12, 1u32..100), 0..40),
        user in 0i64..4,
        max_results in 1usize..10,
    ) {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let persister = InteractionPersister::new(Arc::clone(&storage), ActionWeights::default());
        persister.persist_interactions(&events(&raw)).unwrap();

        let rows: Vec<EventSimilarity> = pairs
            .iter()
            .filter(|(a, b, _)| a != b)
            .map(|(a, b, s)| EventSimilarity {
                event_a: *a.min(b),
                event_b: *a.max(b),
                score: f64::from(*s) / 100.0,
                timestamp: Utc::now(),
            })
            .collect();
        storage.upsert_similarities(&rows).unwrap();

        let engine = RecommendationEngine::new(Arc::clone(&storage));
        let history = storage.interacted_items(user).unwrap();
        let recs = engine.user_recommendations(user, max_results).unwrap();
        prop_assert!(recs.len() <= max_results);
        for rec in &recs {
            prop_assert!(!history.contains(&rec.event_id));
        }
        for item in 0..12 {
            for rec in engine.similar_events(item, user, max_results).unwrap() {
                prop_assert!(!history.contains(&rec.event_id));
            }
        }
    }

    #[test]
    fn prop_interaction_replay_is_unchanged(
        raw in prop::collection::vec((0i64..6, 0i64..4, 0u8..3), 1..30),
    ) {
        let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
        let persister = InteractionPersister::new(Arc::clone(&storage), ActionWeights::default());
        let events = events(&raw);
        persister.persist_interactions(&events).unwrap();
        let replay = persister.persist_interactions(&events).unwrap();
        prop_assert!(replay.iter().all(|o| *o == UpsertOutcome::Unchanged));
    }
}
