//! Single-owner actor around `SimilarityAggregator`.
//!
//! The worker task owns the state; handles send commands over a bounded
//! channel and await a oneshot reply. Events are applied strictly in the
//! order their commands arrive.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use affinity_core::errors::{AffinityResult, AggregatorError};
use affinity_core::models::{InteractionEvent, ItemId, SimilarityUpdate};

use crate::state::{AggregatorStats, SimilarityAggregator};

/// Events between two stats log lines.
const STATS_LOG_EVERY: u64 = 10_000;

enum Command {
    Process {
        events: Vec<InteractionEvent>,
        reply: oneshot::Sender<Vec<SimilarityUpdate>>,
    },
    Similarity {
        a: ItemId,
        b: ItemId,
        reply: oneshot::Sender<f64>,
    },
    Stats {
        reply: oneshot::Sender<AggregatorStats>,
    },
}

pub struct AggregatorWorker {
    state: SimilarityAggregator,
    commands: mpsc::Receiver<Command>,
    processed: u64,
}

impl AggregatorWorker {
    /// Spawn the worker. It runs until every handle is dropped and then
    /// yields the state back through the join handle.
    pub fn spawn(
        state: SimilarityAggregator,
        capacity: usize,
    ) -> (AggregatorHandle, JoinHandle<SimilarityAggregator>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = Self {
            state,
            commands: rx,
            processed: 0,
        };
        let join = tokio::spawn(worker.run());
        (AggregatorHandle { commands: tx }, join)
    }

    async fn run(mut self) -> SimilarityAggregator {
        info!("aggregator worker started");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Process { events, reply } => {
                    let updates = self.apply(&events);
                    // A dropped receiver only means the caller gave up.
                    let _ = reply.send(updates);
                }
                Command::Similarity { a, b, reply } => {
                    let _ = reply.send(self.state.similarity(a, b));
                }
                Command::Stats { reply } => {
                    let _ = reply.send(self.state.stats());
                }
            }
        }
        let stats = self.state.stats();
        info!(
            processed = self.processed,
            items = stats.items,
            cached_pairs = stats.cached_pairs,
            "aggregator worker stopped"
        );
        self.state
    }

    fn apply(&mut self, events: &[InteractionEvent]) -> Vec<SimilarityUpdate> {
        let mut updates = Vec::new();
        for event in events {
            updates.extend(self.state.process(event));
            self.processed += 1;
            if self.processed % STATS_LOG_EVERY == 0 {
                let stats = self.state.stats();
                info!(
                    processed = self.processed,
                    items = stats.items,
                    users = stats.users,
                    weights = stats.weights,
                    cached_pairs = stats.cached_pairs,
                    "aggregator state size"
                );
            }
        }
        debug!(events = events.len(), updates = updates.len(), "events applied");
        updates
    }
}

/// Cloneable sender side of the worker.
#[derive(Clone)]
pub struct AggregatorHandle {
    commands: mpsc::Sender<Command>,
}

impl AggregatorHandle {
    /// Apply `events` in order; returns every update they caused.
    pub async fn process(
        &self,
        events: Vec<InteractionEvent>,
    ) -> AffinityResult<Vec<SimilarityUpdate>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Process { events, reply }).await?;
        rx.await.map_err(|_| AggregatorError::WorkerStopped.into())
    }

    pub async fn similarity(&self, a: ItemId, b: ItemId) -> AffinityResult<f64> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Similarity { a, b, reply }).await?;
        rx.await.map_err(|_| AggregatorError::WorkerStopped.into())
    }

    pub async fn stats(&self) -> AffinityResult<AggregatorStats> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats { reply }).await?;
        rx.await.map_err(|_| AggregatorError::WorkerStopped.into())
    }

    async fn send(&self, command: Command) -> AffinityResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AggregatorError::WorkerStopped.into())
    }
}
