//! Incremental similarity state.
//!
//! For a user `u` raising their weight on item `A` from `old` to `new`, the
//! contribution `min(w(A,u), w(B,u))` to `M(A,B)` only changes in one of
//! three ways, so a cached `M(A,B)` is patched in O(1) instead of being
//! recomputed over the common users.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::trace;

use affinity_core::config::ActionWeights;
use affinity_core::models::{InteractionEvent, ItemId, PairKey, SimilarityUpdate, UserId};

use crate::score;

/// Sizes of the in-memory maps. Nothing is ever evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub items: usize,
    pub users: usize,
    pub weights: usize,
    pub cached_pairs: usize,
}

#[derive(Debug, Clone)]
pub struct SimilarityAggregator {
    weights: ActionWeights,
    weight_by_item_user: HashMap<ItemId, HashMap<UserId, f64>>,
    /// Reverse index: the items each user has a weight on.
    items_by_user: HashMap<UserId, BTreeSet<ItemId>>,
    mass_by_item: HashMap<ItemId, f64>,
    min_mass_by_pair: HashMap<PairKey, f64>,
}

impl SimilarityAggregator {
    pub fn new(weights: ActionWeights) -> Self {
        Self {
            weights,
            weight_by_item_user: HashMap::new(),
            items_by_user: HashMap::new(),
            mass_by_item: HashMap::new(),
            min_mass_by_pair: HashMap::new(),
        }
    }

    /// Apply one event and return the updates it causes, stamped now.
    pub fn process(&mut self, event: &InteractionEvent) -> Vec<SimilarityUpdate> {
        self.process_at(event, Utc::now())
    }

    /// Apply one event. Updates are ordered by the other item's id.
    pub fn process_at(
        &mut self,
        event: &InteractionEvent,
        now: DateTime<Utc>,
    ) -> Vec<SimilarityUpdate> {
        let item = event.event_id;
        let user = event.user_id;
        let new_weight = self.weights.weight(event.action_type);
        let old_weight = self.weight(item, user);

        let delta = match old_weight {
            Some(old) if new_weight > old => new_weight - old,
            Some(_) => 0.0,
            None => new_weight,
        };
        if delta <= 0.0 {
            return Vec::new();
        }
        let old_a = old_weight.unwrap_or(0.0);

        self.weight_by_item_user
            .entry(item)
            .or_default()
            .insert(user, new_weight);
        self.items_by_user.entry(user).or_default().insert(item);
        *self.mass_by_item.entry(item).or_insert(0.0) += delta;

        let others: Vec<ItemId> = self
            .items_by_user
            .get(&user)
            .map(|items| items.iter().copied().filter(|b| *b != item).collect())
            .unwrap_or_default();

        let mut updates = Vec::new();
        for other in others {
            let Some(weight_b) = self.weight(other, user) else {
                continue;
            };
            let pair = PairKey::new(item, other);
            let min_mass = match self.min_mass_by_pair.get(&pair).copied() {
                None => self.compute_min_mass(item, other),
                Some(cached) if old_a < weight_b && weight_b <= new_weight => {
                    cached + (weight_b - old_a)
                }
                Some(cached) if new_weight <= weight_b => cached + delta,
                Some(cached) => cached,
            };
            self.min_mass_by_pair.insert(pair, min_mass);

            let sim = score(min_mass, self.mass(item), self.mass(other));
            trace!(lo = pair.lo, hi = pair.hi, min_mass, sim, "pair updated");
            if sim > 0.0 {
                updates.push(SimilarityUpdate::new(pair, sim, now));
            }
        }
        updates
    }

    pub fn weight(&self, item: ItemId, user: UserId) -> Option<f64> {
        self.weight_by_item_user
            .get(&item)
            .and_then(|users| users.get(&user))
            .copied()
    }

    pub fn mass(&self, item: ItemId) -> f64 {
        self.mass_by_item.get(&item).copied().unwrap_or(0.0)
    }

    /// Cached min-mass of the pair, or a fresh sum over common users.
    pub fn min_mass(&self, a: ItemId, b: ItemId) -> f64 {
        if a == b {
            return 0.0;
        }
        match self.min_mass_by_pair.get(&PairKey::new(a, b)) {
            Some(cached) => *cached,
            None => self.compute_min_mass(a, b),
        }
    }

    /// Current score of the pair from state; symmetric in `a` and `b`.
    pub fn similarity(&self, a: ItemId, b: ItemId) -> f64 {
        if a == b {
            return 0.0;
        }
        score(self.min_mass(a, b), self.mass(a), self.mass(b))
    }

    pub fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            items: self.weight_by_item_user.len(),
            users: self.items_by_user.len(),
            weights: self.weight_by_item_user.values().map(HashMap::len).sum(),
            cached_pairs: self.min_mass_by_pair.len(),
        }
    }

    fn compute_min_mass(&self, a: ItemId, b: ItemId) -> f64 {
        let (Some(users_a), Some(users_b)) = (
            self.weight_by_item_user.get(&a),
            self.weight_by_item_user.get(&b),
        ) else {
            return 0.0;
        };
        let (small, large) = if users_a.len() <= users_b.len() {
            (users_a, users_b)
        } else {
            (users_b, users_a)
        };
        small
            .iter()
            .filter_map(|(user, w)| large.get(user).map(|other| w.min(*other)))
            .sum()
    }
}
