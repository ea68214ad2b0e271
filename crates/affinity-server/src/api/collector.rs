//! Collector ingestion endpoint: validate, stamp, append, acknowledge.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use affinity_core::models::{ActionType, InteractionEvent, ItemId, UserActionMessage, UserId};
use affinity_core::traits::IMessageProducer;
use affinity_transport::LogProducer;

use super::ApiError;

#[derive(Clone)]
pub struct CollectorState {
    producer: LogProducer,
    topic: String,
}

impl CollectorState {
    pub fn new(producer: LogProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

pub fn collector_router(state: CollectorState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/actions", post(record_user_action))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUserActionRequest {
    pub event_id: ItemId,
    pub user_id: UserId,
    pub action_type: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionAck {
    pub partition: u32,
    pub offset: u64,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "timestamp": Utc::now() }))
}

/// Acknowledged only after the append is durable, keyed by `eventId`.
async fn record_user_action(
    State(state): State<CollectorState>,
    Json(request): Json<RecordUserActionRequest>,
) -> Result<(StatusCode, Json<ActionAck>), ApiError> {
    let action_type: ActionType = request
        .action_type
        .parse()
        .map_err(|e: affinity_core::errors::EventError| ApiError::BadRequest(e.to_string()))?;
    let event = InteractionEvent::new(
        request.event_id,
        request.user_id,
        action_type,
        request.timestamp.unwrap_or_else(Utc::now),
    );
    let payload = UserActionMessage::encode(&event)?;

    let key = event.event_id;
    let delivery =
        tokio::task::spawn_blocking(move || state.producer.send(&state.topic, key, &payload))
            .await??;
    debug!(
        event_id = event.event_id,
        user_id = event.user_id,
        partition = delivery.partition,
        offset = delivery.offset,
        "user action recorded"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionAck {
            partition: delivery.partition,
            offset: delivery.offset,
        }),
    ))
}
