// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_PATH: &str = "affinity.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Transport ---
pub const DEFAULT_LOG_PATH: &str = "affinity-log.db";
pub const DEFAULT_PARTITIONS: u32 = 3;
pub const DEFAULT_USER_ACTIONS_TOPIC: &str = "stats.user-actions.v1";
pub const DEFAULT_SIMILARITY_TOPIC: &str = "stats.events-similarity.v1";
pub const DEFAULT_AGGREGATOR_GROUP: &str = "aggregator";
pub const DEFAULT_INTERACTION_GROUP: &str = "analyzer-user-actions";
pub const DEFAULT_SIMILARITY_GROUP: &str = "analyzer-events-similarity";
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_MAX_POLL_RECORDS: usize = 500;
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 1_000;

// --- Weights ---
pub const DEFAULT_VIEW_WEIGHT: f64 = 0.4;
pub const DEFAULT_REGISTER_WEIGHT: f64 = 0.8;
pub const DEFAULT_LIKE_WEIGHT: f64 = 1.0;

// --- Server ---
pub const DEFAULT_COLLECTOR_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_ANALYZER_BIND: &str = "0.0.0.0:9091";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
