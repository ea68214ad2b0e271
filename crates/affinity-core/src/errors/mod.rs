//! Error handling for Affinity.
//! One error enum per subsystem, `thiserror` only, aggregated into `AffinityError`.

pub mod aggregator_error;
pub mod config_error;
pub mod event_error;
pub mod storage_error;
pub mod transport_error;

pub use aggregator_error::AggregatorError;
pub use config_error::ConfigError;
pub use event_error::EventError;
pub use storage_error::StorageError;
pub use transport_error::TransportError;

/// Top-level error type. Subsystem errors convert in via `From`.
#[derive(Debug, thiserror::Error)]
pub enum AffinityError {
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("transport error: {0}")]
    TransportError(#[from] TransportError),

    #[error("event error: {0}")]
    EventError(#[from] EventError),

    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("aggregator error: {0}")]
    AggregatorError(#[from] AggregatorError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Work moved off the runtime panicked or was cancelled. Fatal.
    #[error("blocking task failed: {0}")]
    TaskFailed(String),
}

impl AffinityError {
    /// Connectivity failure on consume, produce, or commit.
    /// The stream runner reconnects and resumes from the last committed offset.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError(_))
    }

    /// Durable-store failure. The batch is retried, its commit withheld.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageError(_))
    }
}

pub type AffinityResult<T> = Result<T, AffinityError>;
