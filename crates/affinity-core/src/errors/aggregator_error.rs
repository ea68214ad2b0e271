/// Errors from the aggregator worker's message-passing interface.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("aggregator worker stopped")]
    WorkerStopped,
}
