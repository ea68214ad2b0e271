//! Process roles. Each one opens what it needs, runs until the shutdown
//! signal, drains, and returns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use affinity_aggregator::{
    replay_committed, AggregationHandler, AggregatorWorker, SimilarityAggregator,
};
use affinity_analyzer::{InteractionPersister, SimilarityPersister};
use affinity_core::AffinityConfig;
use affinity_storage::StorageEngine;
use affinity_transport::{run_consumer_loop, BatchHandler, LoopOptions, LoopStats, MessageLog};

use crate::api::{collector_router, query_router, CollectorState, QueryState};
use crate::shutdown::Shutdown;

/// Bound on queued commands to the aggregator worker.
const AGGREGATOR_QUEUE: usize = 64;

pub async fn run_collector(config: &AffinityConfig, shutdown: &Shutdown) -> Result<()> {
    let log = MessageLog::open_with_config(&config.transport)?;
    serve_collector(&log, config, shutdown).await
}

pub async fn run_aggregator(config: &AffinityConfig, shutdown: &Shutdown) -> Result<()> {
    let log = MessageLog::open_with_config(&config.transport)?;
    aggregate(log, config.clone(), shutdown.clone()).await
}

pub async fn run_analyzer(config: &AffinityConfig, shutdown: &Shutdown) -> Result<()> {
    let log = MessageLog::open_with_config(&config.transport)?;
    let storage = Arc::new(StorageEngine::open_with_config(&config.storage)?);
    analyze(&log, storage, config, shutdown).await
}

/// Collector, aggregator, and analyzer in one process over one log and store.
pub async fn run_standalone(config: &AffinityConfig, shutdown: &Shutdown) -> Result<()> {
    let log = MessageLog::open_with_config(&config.transport)?;
    let storage = Arc::new(StorageEngine::open_with_config(&config.storage)?);

    let aggregator = tokio::spawn(aggregate(log.clone(), config.clone(), shutdown.clone()));
    let (collector, analyzer) = tokio::join!(
        serve_collector(&log, config, shutdown),
        analyze(&log, storage, config, shutdown),
    );
    let aggregated = aggregator.await.context("aggregator task panicked")?;
    collector.and(analyzer).and(aggregated)
}

async fn serve_collector(
    log: &MessageLog,
    config: &AffinityConfig,
    shutdown: &Shutdown,
) -> Result<()> {
    let state = CollectorState::new(log.producer(), config.transport.user_actions_topic.clone());
    serve("collector", &config.server.collector_bind, collector_router(state), shutdown).await
}

async fn aggregate(log: MessageLog, config: AffinityConfig, shutdown: Shutdown) -> Result<()> {
    let result = aggregate_until_shutdown(log, &config, &shutdown).await;
    if let Err(e) = &result {
        error!(error = %e, "aggregator failed");
        shutdown.trigger();
    }
    result
}

async fn aggregate_until_shutdown(
    log: MessageLog,
    config: &AffinityConfig,
    shutdown: &Shutdown,
) -> Result<()> {
    let transport = &config.transport;
    let (handle, worker) =
        AggregatorWorker::spawn(SimilarityAggregator::new(config.weights), AGGREGATOR_QUEUE);

    replay_committed(
        &log,
        &handle,
        &transport.aggregator_group,
        &transport.user_actions_topic,
        transport.max_poll_records,
    )
    .await?;

    let consumer = log.consumer(&transport.aggregator_group, &[&transport.user_actions_topic])?;
    let handler =
        AggregationHandler::new(handle, log.producer(), transport.similarity_topic.clone());
    let stats = run_consumer_loop(
        consumer,
        handler,
        LoopOptions::from_config(transport),
        shutdown.subscribe(),
    )
    .await?;

    // The handler held the last handle, so the worker has stopped.
    let state = worker.await.context("aggregator worker panicked")?;
    let sizes = state.stats();
    info!(
        records = stats.records,
        items = sizes.items,
        cached_pairs = sizes.cached_pairs,
        "aggregator stopped"
    );
    Ok(())
}

/// Both persister loops as independent tasks, plus the query server.
async fn analyze(
    log: &MessageLog,
    storage: Arc<StorageEngine>,
    config: &AffinityConfig,
    shutdown: &Shutdown,
) -> Result<()> {
    let transport = &config.transport;
    let options = LoopOptions::from_config(transport);

    let interactions = spawn_loop(
        log,
        &transport.interaction_group,
        &transport.user_actions_topic,
        InteractionPersister::new(Arc::clone(&storage), config.weights),
        options.clone(),
        shutdown,
    )?;
    let similarities = spawn_loop(
        log,
        &transport.similarity_group,
        &transport.similarity_topic,
        SimilarityPersister::new(Arc::clone(&storage)),
        options,
        shutdown,
    )?;

    let served = serve(
        "analyzer",
        &config.server.analyzer_bind,
        query_router(QueryState::new(storage)),
        shutdown,
    )
    .await;

    let interactions = interactions.await.context("interaction loop panicked")?;
    let similarities = similarities.await.context("similarity loop panicked")?;
    served?;
    interactions?;
    similarities?;
    Ok(())
}

fn spawn_loop<H>(
    log: &MessageLog,
    group: &str,
    topic: &str,
    handler: H,
    options: LoopOptions,
    shutdown: &Shutdown,
) -> Result<JoinHandle<Result<LoopStats>>>
where
    H: BatchHandler + 'static,
{
    let consumer = log.consumer(group, &[topic])?;
    let shutdown = shutdown.clone();
    let group = group.to_string();
    Ok(tokio::spawn(async move {
        let result = run_consumer_loop(consumer, handler, options, shutdown.subscribe()).await;
        if let Err(e) = &result {
            error!(group = %group, error = %e, "consumer loop failed");
            shutdown.trigger();
        }
        Ok(result?)
    }))
}

async fn serve(name: &str, bind: &str, router: Router, shutdown: &Shutdown) -> Result<()> {
    let result = serve_until_shutdown(name, bind, router, shutdown).await;
    if let Err(e) = &result {
        error!(server = name, error = %e, "server failed");
        shutdown.trigger();
    }
    result
}

async fn serve_until_shutdown(
    name: &str,
    bind: &str,
    router: Router,
    shutdown: &Shutdown,
) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid {name} bind address {bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {name} to {addr}"))?;
    info!(server = name, %addr, "listening");

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { signal.wait().await })
        .await?;
    info!(server = name, "server stopped");
    Ok(())
}
