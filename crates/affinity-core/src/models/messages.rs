//! JSON wire messages carried by the message log.
//!
//! Inbound: `{userId, eventId, actionType, timestamp}` on the user-actions topic.
//! Outbound: `{eventA, eventB, score, timestamp}` on the similarity topic,
//! always with `eventA < eventB`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InteractionEvent, ItemId, SimilarityUpdate, UserId};
use crate::errors::{AffinityResult, EventError};

/// Wire form of an interaction event. `action_type` stays a string until
/// decode so that unknown kinds surface as `EventError::UnknownActionType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionMessage {
    pub user_id: UserId,
    pub event_id: ItemId,
    pub action_type: String,
    pub timestamp: DateTime<Utc>,
}

impl UserActionMessage {
    pub fn encode(event: &InteractionEvent) -> AffinityResult<String> {
        let message = Self {
            user_id: event.user_id,
            event_id: event.event_id,
            action_type: event.action_type.to_string(),
            timestamp: event.timestamp,
        };
        Ok(serde_json::to_string(&message)?)
    }

    pub fn decode(payload: &str) -> Result<InteractionEvent, EventError> {
        let message: Self =
            serde_json::from_str(payload).map_err(|e| EventError::MalformedPayload {
                reason: e.to_string(),
            })?;
        Ok(InteractionEvent {
            event_id: message.event_id,
            user_id: message.user_id,
            action_type: message.action_type.parse()?,
            timestamp: message.timestamp,
        })
    }
}

/// Wire form of a similarity update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMessage {
    #[serde(rename = "eventA")]
    pub event_a: ItemId,
    #[serde(rename = "eventB")]
    pub event_b: ItemId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl SimilarityMessage {
    pub fn encode(update: &SimilarityUpdate) -> AffinityResult<String> {
        let message = Self {
            event_a: update.event_a,
            event_b: update.event_b,
            score: update.score,
            timestamp: update.timestamp,
        };
        Ok(serde_json::to_string(&message)?)
    }

    pub fn decode(payload: &str) -> Result<SimilarityUpdate, EventError> {
        let message: Self =
            serde_json::from_str(payload).map_err(|e| EventError::MalformedPayload {
                reason: e.to_string(),
            })?;
        if message.event_a >= message.event_b {
            return Err(EventError::NonCanonicalPair {
                event_a: message.event_a,
                event_b: message.event_b,
            });
        }
        if !message.score.is_finite() {
            return Err(EventError::MalformedPayload {
                reason: format!("non-finite score {}", message.score),
            });
        }
        Ok(SimilarityUpdate {
            event_a: message.event_a,
            event_b: message.event_b,
            score: message.score,
            timestamp: message.timestamp,
        })
    }
}
