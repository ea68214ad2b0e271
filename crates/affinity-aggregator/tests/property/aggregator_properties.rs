//! Property tests: monotonic weights, incremental equals batch, symmetry,
//! zero suppression.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use affinity_aggregator::batch::recompute;
use affinity_aggregator::SimilarityAggregator;
use affinity_core::config::ActionWeights;
use affinity_core::models::{ActionType, InteractionEvent, PairKey};

fn weights() -> ActionWeights {
    ActionWeights::new(0.4, 0.8, 1.0)
}

fn zero_view_weights() -> ActionWeights {
    ActionWeights::new(0.0, 0.8, 1.0)
}

fn action_strategy() -> impl Strategy<Value = ActionType> {
    prop_oneof![
        Just(ActionType::View),
        Just(ActionType::Register),
        Just(ActionType::Like),
    ]
}

fn events_strategy() -> impl Strategy<Value = Vec<InteractionEvent>> {
    prop::collection::vec((0i64..8, 0i64..6, action_strategy()), 0..80).prop_map(|raw| {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        raw.into_iter()
            .map(|(item, user, action)| InteractionEvent::new(item, user, action, ts))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_weight_is_max_observed(events in events_strategy()) {
        let w = weights();
        let mut agg = SimilarityAggregator::new(w);
        for e in &events {
            agg.process(e);
        }
        for e in &events {
            let expected = events
                .iter()
                .filter(|o| o.event_id == e.event_id && o.user_id == e.user_id)
                .map(|o| w.weight(o.action_type))
                .fold(f64::MIN, f64::max);
            prop_assert_eq!(agg.weight(e.event_id, e.user_id), Some(expected));
        }
    }

    #[test]
    fn prop_incremental_equals_batch(events in events_strategy()) {
        let w = weights();
        let mut agg = SimilarityAggregator::new(w);
        for e in &events {
            agg.process(e);
        }
        let batch = recompute(&events, &w);

        let items: Vec<i64> = {
            let set: HashSet<i64> = events.iter().map(|e| e.event_id).collect();
            set.into_iter().collect()
        };
        for &a in &items {
            for &b in &items {
                if a >= b {
                    continue;
                }
                let expected = batch.get(&PairKey::new(a, b)).copied().unwrap_or(0.0);
                let incremental = agg.similarity(a, b);
                prop_assert!(
                    (incremental - expected).abs() < 1e-9,
                    "pair ({}, {}): incremental {} vs batch {}", a, b, incremental, expected
                );
            }
        }
    }

    #[test]
    fn prop_last_emitted_score_matches_batch_for_touched_pairs(events in events_strategy()) {
        // Updates emitted by the last event see the final state.
        let w = weights();
        let mut agg = SimilarityAggregator::new(w);
        let mut emitted = Vec::new();
        for e in &events {
            emitted = agg.process(e);
        }
        let batch = recompute(&events, &w);
        for update in emitted {
            let expected = batch.get(&update.pair()).copied().unwrap_or(0.0);
            prop_assert!((update.score - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_updates_are_canonical_symmetric_and_positive(events in events_strategy()) {
        let mut agg = SimilarityAggregator::new(weights());
        for e in &events {
            for update in agg.process(e) {
                prop_assert!(update.event_a < update.event_b);
                prop_assert!(update.score > 0.0);
                prop_assert!(update.score <= 1.0 + 1e-9);
            }
        }
        let items: Vec<i64> = (0..8).collect();
        for &a in &items {
            for &b in &items {
                prop_assert_eq!(agg.similarity(a, b), agg.similarity(b, a));
            }
        }
    }

    #[test]
    fn prop_disjoint_users_never_emit(events in events_strategy()) {
        // Even users only touch even items and odd users only odd items,
        // so even/odd pairs share no user.
        let filtered: Vec<InteractionEvent> = events
            .into_iter()
            .filter(|e| e.event_id % 2 == e.user_id % 2)
            .collect();
        let mut agg = SimilarityAggregator::new(weights());
        for e in &filtered {
            for update in agg.process(e) {
                prop_assert_eq!(update.event_a % 2, update.event_b % 2);
            }
        }
    }

    #[test]
    fn prop_zero_weight_views_match_batch_and_emit_only_positive(events in events_strategy()) {
        let w = zero_view_weights();
        let mut agg = SimilarityAggregator::new(w);
        for e in &events {
            for update in agg.process(e) {
                prop_assert!(update.score > 0.0);
            }
        }
        let batch = recompute(&events, &w);
        for a in 0..8i64 {
            for b in (a + 1)..8 {
                let expected = batch.get(&PairKey::new(a, b)).copied().unwrap_or(0.0);
                prop_assert!((agg.similarity(a, b) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn prop_view_only_common_users_never_emit(events in events_strategy()) {
        // Item 0 only ever gets zero-weight views, so no pair with it scores.
        let events: Vec<InteractionEvent> = events
            .into_iter()
            .map(|mut e| {
                if e.event_id == 0 {
                    e.action_type = ActionType::View;
                }
                e
            })
            .collect();
        let mut agg = SimilarityAggregator::new(zero_view_weights());
        for e in &events {
            for update in agg.process(e) {
                prop_assert!(update.event_a != 0);
            }
        }
        for b in 1..8 {
            prop_assert_eq!(agg.similarity(0, b), 0.0);
        }
    }
}
