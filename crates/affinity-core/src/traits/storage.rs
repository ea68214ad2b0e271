use std::collections::{HashMap, HashSet};

use crate::errors::AffinityResult;
use crate::models::{EventSimilarity, ItemId, UserAction, UserId};

/// What an idempotent upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Durable store of per-(item, user) engagement rows.
pub trait IActionStorage: Send + Sync {
    /// Max-merge upsert of each row in one transaction: insert when absent,
    /// otherwise raise `calc` (and bump `timestamp`) only when the new value is
    /// larger. Replaying a row is a no-op.
    fn upsert_user_actions(&self, actions: &[UserAction]) -> AffinityResult<Vec<UpsertOutcome>>;

    fn get_user_action(&self, event_id: ItemId, user_id: UserId)
        -> AffinityResult<Option<UserAction>>;

    /// The user's `limit` most recent rows, newest first.
    fn recent_user_actions(&self, user_id: UserId, limit: usize)
        -> AffinityResult<Vec<UserAction>>;

    /// Every item the user has interacted with.
    fn interacted_items(&self, user_id: UserId) -> AffinityResult<HashSet<ItemId>>;

    /// `Σ calc` per item across all users. Items without rows are absent.
    fn interaction_sums(&self, event_ids: &[ItemId]) -> AffinityResult<HashMap<ItemId, f64>>;
}

/// Durable store of pairwise similarity rows.
pub trait ISimilarityStorage: Send + Sync {
    /// Last-write-wins upsert of each row in one transaction.
    fn upsert_similarities(&self, rows: &[EventSimilarity]) -> AffinityResult<Vec<UpsertOutcome>>;

    fn get_similarity(&self, a: ItemId, b: ItemId) -> AffinityResult<Option<EventSimilarity>>;

    /// Rows with `item` on either side, highest score first.
    fn similarities_for(&self, item: ItemId) -> AffinityResult<Vec<EventSimilarity>>;

    /// Rows touching any of `items` on either side, highest score first.
    fn similarities_touching(&self, items: &[ItemId]) -> AffinityResult<Vec<EventSimilarity>>;
}
