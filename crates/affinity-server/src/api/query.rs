//! Query RPC: three streamed queries plus health.
//!
//! Storage reads are blocking SQLite calls and run on the blocking pool.
//! Each result is computed in full before the response starts.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use affinity_analyzer::RecommendationEngine;
use affinity_core::errors::AffinityResult;
use affinity_core::models::{ItemId, RecommendedEvent, UserId};
use affinity_storage::{StorageEngine, StoreStats};

use super::{ndjson, ApiError};

#[derive(Clone)]
pub struct QueryState {
    engine: RecommendationEngine<StorageEngine>,
}

impl QueryState {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self {
            engine: RecommendationEngine::new(storage),
        }
    }

    async fn run<F>(&self, query: F) -> Result<Vec<RecommendedEvent>, ApiError>
    where
        F: FnOnce(&RecommendationEngine<StorageEngine>) -> AffinityResult<Vec<RecommendedEvent>>
            + Send
            + 'static,
    {
        let engine = self.engine.clone();
        Ok(tokio::task::spawn_blocking(move || query(&engine)).await??)
    }
}

pub fn query_router(state: QueryState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/recommendations/user", post(user_recommendations))
        .route("/rpc/recommendations/similar", post(similar_events))
        .route("/rpc/interactions/count", post(interaction_counts))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecommendationsRequest {
    pub user_id: UserId,
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarEventsRequest {
    pub event_id: ItemId,
    pub user_id: UserId,
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionCountsRequest {
    pub event_ids: Vec<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub user_actions: u64,
    pub similarities: u64,
}

async fn health(State(state): State<QueryState>) -> Result<Json<HealthResponse>, ApiError> {
    let engine = state.engine.clone();
    let stats: StoreStats = tokio::task::spawn_blocking(move || engine.storage().stats()).await??;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        user_actions: stats.user_actions,
        similarities: stats.similarities,
    }))
}

async fn user_recommendations(
    State(state): State<QueryState>,
    Json(request): Json<UserRecommendationsRequest>,
) -> Result<Response, ApiError> {
    let results = state
        .run(move |engine| engine.user_recommendations(request.user_id, request.max_results))
        .await?;
    ndjson(&results)
}

async fn similar_events(
    State(state): State<QueryState>,
    Json(request): Json<SimilarEventsRequest>,
) -> Result<Response, ApiError> {
    let results = state
        .run(move |engine| {
            engine.similar_events(request.event_id, request.user_id, request.max_results)
        })
        .await?;
    ndjson(&results)
}

async fn interaction_counts(
    State(state): State<QueryState>,
    Json(request): Json<InteractionCountsRequest>,
) -> Result<Response, ApiError> {
    let results = state
        .run(move |engine| engine.interaction_counts(&request.event_ids))
        .await?;
    ndjson(&results)
}
