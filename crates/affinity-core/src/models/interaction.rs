use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActionType, ItemId, UserId};

/// One user's recorded action on one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub event_id: ItemId,
    pub user_id: UserId,
    pub action_type: ActionType,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(
        event_id: ItemId,
        user_id: UserId,
        action_type: ActionType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            user_id,
            action_type,
            timestamp,
        }
    }
}

/// Persisted per-(item, user) engagement row.
///
/// `calc` is the maximum action weight ever observed for the pair;
/// `timestamp` is the time of the action that last raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    pub event_id: ItemId,
    pub user_id: UserId,
    pub calc: f64,
    pub timestamp: DateTime<Utc>,
}
