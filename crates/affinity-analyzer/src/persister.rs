//! Batch handlers that persist the two topics.
//!
//! Both are safe to replay: interactions max-merge, similarities are
//! last-write-wins on a pair that only ever receives its latest score.
//! Undecodable records are dropped; storage failures fail the batch so the
//! runner withholds the commit. The SQLite writes run on tokio's blocking
//! pool, never on a runtime worker.

use std::sync::Arc;

use affinity_core::config::ActionWeights;
use affinity_core::errors::{AffinityError, AffinityResult, EventError};
use affinity_core::models::{
    EventSimilarity, InteractionEvent, SimilarityMessage, SimilarityUpdate, UserAction,
    UserActionMessage,
};
use affinity_core::traits::{IActionStorage, ISimilarityStorage, LogRecord, UpsertOutcome};
use affinity_observability::persist_span;
use affinity_transport::BatchHandler;
use tracing::{debug, warn};

pub struct InteractionPersister<S> {
    storage: Arc<S>,
    weights: ActionWeights,
}

impl<S: IActionStorage> InteractionPersister<S> {
    pub fn new(storage: Arc<S>, weights: ActionWeights) -> Self {
        Self { storage, weights }
    }

    pub fn persist_interaction(&self, event: &InteractionEvent) -> AffinityResult<UpsertOutcome> {
        let mut outcomes = self.persist_interactions(std::slice::from_ref(event))?;
        Ok(outcomes.pop().unwrap_or(UpsertOutcome::Unchanged))
    }

    /// Upsert every event in one transaction, `calc` set from its action weight.
    pub fn persist_interactions(
        &self,
        events: &[InteractionEvent],
    ) -> AffinityResult<Vec<UpsertOutcome>> {
        self.storage.upsert_user_actions(&self.to_actions(events))
    }

    fn to_actions(&self, events: &[InteractionEvent]) -> Vec<UserAction> {
        events
            .iter()
            .map(|event| UserAction {
                event_id: event.event_id,
                user_id: event.user_id,
                calc: self.weights.weight(event.action_type),
                timestamp: event.timestamp,
            })
            .collect()
    }
}

impl<S: IActionStorage + 'static> BatchHandler for InteractionPersister<S> {
    async fn handle_batch(&mut self, records: &[LogRecord]) -> AffinityResult<()> {
        let actions = self.to_actions(&decode_all(records, UserActionMessage::decode));
        let storage = Arc::clone(&self.storage);
        let span = persist_span!("user_actions", actions.len());
        let outcomes =
            run_blocking(move || span.in_scope(|| storage.upsert_user_actions(&actions))).await?;
        log_outcomes("user_actions", &outcomes);
        Ok(())
    }
}

pub struct SimilarityPersister<S> {
    storage: Arc<S>,
}

impl<S: ISimilarityStorage> SimilarityPersister<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn persist_similarity(&self, update: &SimilarityUpdate) -> AffinityResult<UpsertOutcome> {
        let mut outcomes = self.persist_similarities(std::slice::from_ref(update))?;
        Ok(outcomes.pop().unwrap_or(UpsertOutcome::Unchanged))
    }

    /// Upsert in order, so a later update of the same pair wins.
    pub fn persist_similarities(
        &self,
        updates: &[SimilarityUpdate],
    ) -> AffinityResult<Vec<UpsertOutcome>> {
        let rows: Vec<EventSimilarity> = updates.iter().cloned().map(EventSimilarity::from).collect();
        self.storage.upsert_similarities(&rows)
    }
}

impl<S: ISimilarityStorage + 'static> BatchHandler for SimilarityPersister<S> {
    async fn handle_batch(&mut self, records: &[LogRecord]) -> AffinityResult<()> {
        let rows: Vec<EventSimilarity> = decode_all(records, SimilarityMessage::decode)
            .into_iter()
            .map(EventSimilarity::from)
            .collect();
        let storage = Arc::clone(&self.storage);
        let span = persist_span!("event_similarities", rows.len());
        let outcomes =
            run_blocking(move || span.in_scope(|| storage.upsert_similarities(&rows))).await?;
        log_outcomes("event_similarities", &outcomes);
        Ok(())
    }
}

async fn run_blocking<T, F>(f: F) -> AffinityResult<T>
where
    F: FnOnce() -> AffinityResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AffinityError::TaskFailed(e.to_string()))?
}

fn decode_all<T>(records: &[LogRecord], decode: fn(&str) -> Result<T, EventError>) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match decode(&record.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "dropping malformed record"
                );
                None
            }
        })
        .collect()
}

fn log_outcomes(table: &str, outcomes: &[UpsertOutcome]) {
    let inserted = outcomes.iter().filter(|o| **o == UpsertOutcome::Inserted).count();
    let updated = outcomes.iter().filter(|o| **o == UpsertOutcome::Updated).count();
    debug!(
        table,
        inserted,
        updated,
        unchanged = outcomes.len() - inserted - updated,
        "batch persisted"
    );
}
