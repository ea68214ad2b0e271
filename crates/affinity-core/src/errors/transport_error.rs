/// Message-log errors on consume, produce, and commit.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("message log disconnected: {reason}")]
    Disconnected { reason: String },

    #[error("unknown topic: {topic}")]
    UnknownTopic { topic: String },

    #[error("failed to commit offsets for group {group}: {reason}")]
    CommitFailed { group: String, reason: String },

    #[error("failed to produce to topic {topic}: {reason}")]
    ProduceFailed { topic: String, reason: String },
}
