//! The consume-process-commit loop shared by every stream consumer.
//!
//! One batch at a time: poll, hand the batch to the handler, commit only
//! after the handler returns `Ok`. Transport failures reconnect and resume
//! from the committed offsets. Storage failures withhold the commit and
//! rewind, so the same records are delivered again. Shutdown interrupts the
//! poll only; the batch in flight always finishes and a final commit is
//! issued before returning.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use affinity_core::config::TransportConfig;
use affinity_core::errors::AffinityResult;
use affinity_core::traits::{IMessageConsumer, LogRecord};

use crate::poll::poll;

/// Processes one polled batch. Must be idempotent: a batch whose commit was
/// lost is delivered again.
///
/// Runs on a runtime worker. Writes to the durable store go through
/// `tokio::task::spawn_blocking`. Appends to the local message log may stay
/// inline; they are short single-transaction writes, the same as the
/// loop's own fetch and commit.
pub trait BatchHandler: Send {
    fn handle_batch(
        &mut self,
        records: &[LogRecord],
    ) -> impl Future<Output = AffinityResult<()>> + Send;
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub max_records: usize,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause before reconnecting or retrying a failed batch.
    pub backoff: Duration,
}

impl LoopOptions {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_records: config.max_poll_records,
            poll_timeout: config.poll_timeout(),
            poll_interval: config.poll_interval(),
            backoff: config.reconnect_backoff(),
        }
    }
}

/// Counters reported when a loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub batches: u64,
    pub records: u64,
    pub commits: u64,
    pub retries: u64,
    pub reconnects: u64,
}

pub async fn run_consumer_loop<C, H>(
    mut consumer: C,
    mut handler: H,
    options: LoopOptions,
    mut shutdown: watch::Receiver<bool>,
) -> AffinityResult<LoopStats>
where
    C: IMessageConsumer,
    H: BatchHandler,
{
    let group = consumer.group().to_string();
    let mut stats = LoopStats::default();
    info!(group = %group, "consumer loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let polled = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            polled = poll(
                &mut consumer,
                options.max_records,
                options.poll_timeout,
                options.poll_interval,
            ) => polled,
        };

        let records = match polled {
            Ok(records) => records,
            Err(e) if e.is_transport() => {
                warn!(group = %group, error = %e, "poll failed, reconnecting");
                reconnect(&mut consumer, &options, &mut stats).await;
                continue;
            }
            Err(e) => return Err(e),
        };
        if records.is_empty() {
            continue;
        }

        match handler.handle_batch(&records).await {
            Ok(()) => {
                stats.batches += 1;
                stats.records += records.len() as u64;
            }
            Err(e) if e.is_storage() || e.is_transport() => {
                stats.retries += 1;
                warn!(
                    group = %group,
                    records = records.len(),
                    error = %e,
                    "batch failed, commit withheld; retrying from committed offsets"
                );
                if let Err(e) = consumer.rewind() {
                    warn!(group = %group, error = %e, "rewind failed, reconnecting");
                    reconnect(&mut consumer, &options, &mut stats).await;
                } else {
                    sleep(options.backoff).await;
                }
                continue;
            }
            Err(e) => return Err(e),
        }

        match consumer.commit() {
            Ok(()) => stats.commits += 1,
            Err(e) if e.is_transport() => {
                warn!(group = %group, error = %e, "commit failed, reconnecting");
                reconnect(&mut consumer, &options, &mut stats).await;
            }
            Err(e) => return Err(e),
        }
    }

    match consumer.commit() {
        Ok(()) => stats.commits += 1,
        Err(e) => warn!(group = %group, error = %e, "final commit failed"),
    }
    info!(
        group = %group,
        batches = stats.batches,
        records = stats.records,
        commits = stats.commits,
        retries = stats.retries,
        reconnects = stats.reconnects,
        "consumer loop stopped"
    );
    Ok(stats)
}

async fn reconnect<C: IMessageConsumer>(consumer: &mut C, options: &LoopOptions, stats: &mut LoopStats) {
    sleep(options.backoff).await;
    stats.reconnects += 1;
    if let Err(e) = consumer.reconnect() {
        warn!(group = %consumer.group(), error = %e, "reconnect failed");
    }
}
