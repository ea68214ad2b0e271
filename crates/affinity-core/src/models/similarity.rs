use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemId;

/// Canonical key of an unordered item pair: `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub lo: ItemId,
    pub hi: ItemId,
}

impl PairKey {
    /// Build the canonical key for `a` and `b` in either order.
    pub fn new(a: ItemId, b: ItemId) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }
}

/// Similarity score emitted by the aggregator for a canonical pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityUpdate {
    pub event_a: ItemId,
    pub event_b: ItemId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl SimilarityUpdate {
    pub fn new(pair: PairKey, score: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_a: pair.lo,
            event_b: pair.hi,
            score,
            timestamp,
        }
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(self.event_a, self.event_b)
    }
}

/// Persisted similarity row, unique per `(event_a, event_b)` with `event_a < event_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSimilarity {
    pub event_a: ItemId,
    pub event_b: ItemId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl EventSimilarity {
    /// The item on the other side of this row from `item`.
    pub fn neighbor_of(&self, item: ItemId) -> ItemId {
        if item == self.event_a {
            self.event_b
        } else {
            self.event_a
        }
    }
}

impl From<SimilarityUpdate> for EventSimilarity {
    fn from(update: SimilarityUpdate) -> Self {
        Self {
            event_a: update.event_a,
            event_b: update.event_b,
            score: update.score,
            timestamp: update.timestamp,
        }
    }
}
