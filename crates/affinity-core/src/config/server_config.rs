use serde::{Deserialize, Serialize};

use super::defaults;

/// HTTP listener addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Ingestion endpoint (`POST /actions`).
    pub collector_bind: String,
    /// Query RPC endpoint.
    pub analyzer_bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            collector_bind: defaults::DEFAULT_COLLECTOR_BIND.to_string(),
            analyzer_bind: defaults::DEFAULT_ANALYZER_BIND.to_string(),
        }
    }
}
