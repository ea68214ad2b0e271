use serde::{Deserialize, Serialize};

use super::ItemId;

/// One entry of a query result stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedEvent {
    pub event_id: ItemId,
    pub score: f64,
}

impl RecommendedEvent {
    pub fn new(event_id: ItemId, score: f64) -> Self {
        Self { event_id, score }
    }
}
