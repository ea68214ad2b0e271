//! From-scratch recomputation over a full event history. The reference the
//! incremental state must agree with.

use std::collections::{BTreeMap, HashMap};

use affinity_core::config::ActionWeights;
use affinity_core::models::{InteractionEvent, ItemId, PairKey, UserId};

use crate::score;

/// Every pair with a positive score, keyed canonically.
pub fn recompute(events: &[InteractionEvent], weights: &ActionWeights) -> BTreeMap<PairKey, f64> {
    let mut max_weight: HashMap<(ItemId, UserId), f64> = HashMap::new();
    for event in events {
        let w = weights.weight(event.action_type);
        max_weight
            .entry((event.event_id, event.user_id))
            .and_modify(|current| *current = current.max(w))
            .or_insert(w);
    }

    let mut mass: HashMap<ItemId, f64> = HashMap::new();
    let mut by_user: BTreeMap<UserId, Vec<(ItemId, f64)>> = BTreeMap::new();
    for ((item, user), w) in &max_weight {
        *mass.entry(*item).or_insert(0.0) += *w;
        by_user.entry(*user).or_default().push((*item, *w));
    }

    let mut min_mass: BTreeMap<PairKey, f64> = BTreeMap::new();
    for items in by_user.values() {
        for (i, (a, wa)) in items.iter().enumerate() {
            for (b, wb) in &items[i + 1..] {
                *min_mass.entry(PairKey::new(*a, *b)).or_insert(0.0) += wa.min(*wb);
            }
        }
    }

    min_mass
        .into_iter()
        .filter_map(|(pair, m)| {
            let sim = score(
                m,
                mass.get(&pair.lo).copied().unwrap_or(0.0),
                mass.get(&pair.hi).copied().unwrap_or(0.0),
            );
            (sim > 0.0).then_some((pair, sim))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::models::ActionType;
    use chrono::Utc;

    #[test]
    fn worked_example() {
        let events = vec![
            InteractionEvent::new(1, 1, ActionType::View, Utc::now()),
            InteractionEvent::new(2, 1, ActionType::Like, Utc::now()),
            InteractionEvent::new(1, 2, ActionType::Like, Utc::now()),
            InteractionEvent::new(2, 2, ActionType::Like, Utc::now()),
        ];
        let scores = recompute(&events, &ActionWeights::new(0.4, 0.8, 1.0));
        let sim = scores[&PairKey::new(1, 2)];
        assert!((sim - 1.4 / (1.4f64.sqrt() * 2.0f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn items_without_common_users_have_no_pair() {
        let events = vec![
            InteractionEvent::new(1, 1, ActionType::Like, Utc::now()),
            InteractionEvent::new(2, 2, ActionType::Like, Utc::now()),
        ];
        assert!(recompute(&events, &ActionWeights::default()).is_empty());
    }
}
