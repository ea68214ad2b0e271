//! Recommendation queries over persisted interactions and similarities.
//!
//! Every result is ordered by score descending, ties by ascending event id.
//! Unknown users or items are not errors: they produce empty results.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use affinity_core::errors::AffinityResult;
use affinity_core::models::{ItemId, RecommendedEvent, UserId};
use affinity_core::traits::{IActionStorage, ISimilarityStorage};
use affinity_observability::query_span;
use tracing::debug;

pub struct RecommendationEngine<S> {
    storage: Arc<S>,
}

impl<S> Clone for RecommendationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: IActionStorage + ISimilarityStorage> RecommendationEngine<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Neighbors of `event_id` the user has not interacted with.
    pub fn similar_events(
        &self,
        event_id: ItemId,
        user_id: UserId,
        max_results: usize,
    ) -> AffinityResult<Vec<RecommendedEvent>> {
        query_span!("similar_events", event_id).in_scope(|| {
            if max_results == 0 {
                return Ok(Vec::new());
            }
            let seen = self.storage.interacted_items(user_id)?;
            let mut results: Vec<RecommendedEvent> = self
                .storage
                .similarities_for(event_id)?
                .into_iter()
                .map(|row| RecommendedEvent::new(row.neighbor_of(event_id), row.score))
                .filter(|candidate| !seen.contains(&candidate.event_id))
                .collect();
            rank(&mut results, Some(max_results));
            debug!(event_id, user_id, results = results.len(), "similar events");
            Ok(results)
        })
    }

    /// Candidates reached from the user's `max_results` most recent
    /// interactions, scored by the similarity-weighted average of the user's
    /// `calc` on those neighbors.
    pub fn user_recommendations(
        &self,
        user_id: UserId,
        max_results: usize,
    ) -> AffinityResult<Vec<RecommendedEvent>> {
        query_span!("user_recommendations", user_id).in_scope(|| {
            if max_results == 0 {
                return Ok(Vec::new());
            }
            let recent = self.storage.recent_user_actions(user_id, max_results)?;
            if recent.is_empty() {
                return Ok(Vec::new());
            }
            let history = self.storage.interacted_items(user_id)?;
            let calc_by_item: HashMap<ItemId, f64> =
                recent.iter().map(|a| (a.event_id, a.calc)).collect();
            let recent_ids: Vec<ItemId> = recent.iter().map(|a| a.event_id).collect();

            let mut sums: BTreeMap<ItemId, (f64, f64)> = BTreeMap::new();
            for row in self.storage.similarities_touching(&recent_ids)? {
                for (known, candidate) in [(row.event_a, row.event_b), (row.event_b, row.event_a)] {
                    let Some(calc) = calc_by_item.get(&known) else {
                        continue;
                    };
                    if history.contains(&candidate) {
                        continue;
                    }
                    let entry = sums.entry(candidate).or_insert((0.0, 0.0));
                    entry.0 += calc * row.score;
                    entry.1 += row.score;
                }
            }

            let mut results: Vec<RecommendedEvent> = sums
                .into_iter()
                .filter(|(_, (_, weight))| *weight > 0.0)
                .map(|(candidate, (weighted, weight))| {
                    RecommendedEvent::new(candidate, weighted / weight)
                })
                .collect();
            rank(&mut results, Some(max_results));
            debug!(user_id, results = results.len(), "user recommendations");
            Ok(results)
        })
    }

    /// `Σ calc` over all users for each requested item. Every distinct id is
    /// returned; items nobody interacted with score 0.
    pub fn interaction_counts(&self, event_ids: &[ItemId]) -> AffinityResult<Vec<RecommendedEvent>> {
        query_span!("interaction_counts", event_ids.len()).in_scope(|| {
            let mut seen = HashSet::with_capacity(event_ids.len());
            let ids: Vec<ItemId> = event_ids
                .iter()
                .copied()
                .filter(|id| seen.insert(*id))
                .collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let sums = self.storage.interaction_sums(&ids)?;
            let mut results: Vec<RecommendedEvent> = ids
                .into_iter()
                .map(|id| RecommendedEvent::new(id, sums.get(&id).copied().unwrap_or(0.0)))
                .collect();
            rank(&mut results, None);
            Ok(results)
        })
    }
}

fn rank(results: &mut Vec<RecommendedEvent>, limit: Option<usize>) {
    results.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| x.event_id.cmp(&y.event_id))
    });
    if let Some(limit) = limit {
        results.truncate(limit);
    }
}
