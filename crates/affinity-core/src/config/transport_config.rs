use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Message log configuration: location, topics, consumer groups, poll discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Path to the SQLite file backing the message log.
    pub log_path: String,
    /// Partitions per topic. Records are partitioned by item id.
    pub partitions: u32,
    pub user_actions_topic: String,
    pub similarity_topic: String,
    pub aggregator_group: String,
    pub interaction_group: String,
    pub similarity_group: String,
    /// Upper bound on how long a single poll blocks.
    pub poll_timeout_ms: u64,
    /// Sleep between fetch attempts while a poll is waiting.
    pub poll_interval_ms: u64,
    pub max_poll_records: usize,
    /// Pause before reconnecting after a transport failure.
    pub reconnect_backoff_ms: u64,
}

impl TransportConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            log_path: defaults::DEFAULT_LOG_PATH.to_string(),
            partitions: defaults::DEFAULT_PARTITIONS,
            user_actions_topic: defaults::DEFAULT_USER_ACTIONS_TOPIC.to_string(),
            similarity_topic: defaults::DEFAULT_SIMILARITY_TOPIC.to_string(),
            aggregator_group: defaults::DEFAULT_AGGREGATOR_GROUP.to_string(),
            interaction_group: defaults::DEFAULT_INTERACTION_GROUP.to_string(),
            similarity_group: defaults::DEFAULT_SIMILARITY_GROUP.to_string(),
            poll_timeout_ms: defaults::DEFAULT_POLL_TIMEOUT_MS,
            poll_interval_ms: defaults::DEFAULT_POLL_INTERVAL_MS,
            max_poll_records: defaults::DEFAULT_MAX_POLL_RECORDS,
            reconnect_backoff_ms: defaults::DEFAULT_RECONNECT_BACKOFF_MS,
        }
    }
}
