//! Configuration for every Affinity process.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via `apply_cli_overrides`)
//! 2. Environment variables (`AFFINITY_*`)
//! 3. TOML config file
//! 4. Compiled defaults

pub mod defaults;
pub mod observability_config;
pub mod server_config;
pub mod storage_config;
pub mod transport_config;
pub mod weights_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use observability_config::ObservabilityConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;
pub use transport_config::TransportConfig;
pub use weights_config::ActionWeights;

use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AffinityConfig {
    pub storage: StorageConfig,
    pub transport: TransportConfig,
    pub weights: ActionWeights,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_path: Option<String>,
    pub log_path: Option<String>,
}

impl AffinityConfig {
    /// Load configuration: defaults, then `path` (if given), then the process
    /// environment, then CLI flags. The result is validated.
    pub fn load(path: Option<&Path>, cli: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        if let Some(cli) = cli {
            config.apply_cli_overrides(cli);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string. Missing sections keep defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `AFFINITY_*` overrides read through `lookup`.
    /// Unparseable numeric values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AFFINITY_DB_PATH") {
            self.storage.db_path = v;
        }
        if let Some(v) = lookup("AFFINITY_LOG_PATH") {
            self.transport.log_path = v;
        }
        if let Some(v) = lookup("AFFINITY_PARTITIONS").and_then(|v| v.parse().ok()) {
            self.transport.partitions = v;
        }
        if let Some(v) = lookup("AFFINITY_POLL_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.transport.poll_timeout_ms = v;
        }
        if let Some(v) = lookup("AFFINITY_WEIGHT_VIEW").and_then(|v| v.parse().ok()) {
            self.weights.view = v;
        }
        if let Some(v) = lookup("AFFINITY_WEIGHT_REGISTER").and_then(|v| v.parse().ok()) {
            self.weights.register = v;
        }
        if let Some(v) = lookup("AFFINITY_WEIGHT_LIKE").and_then(|v| v.parse().ok()) {
            self.weights.like = v;
        }
        if let Some(v) = lookup("AFFINITY_COLLECTOR_BIND") {
            self.server.collector_bind = v;
        }
        if let Some(v) = lookup("AFFINITY_ANALYZER_BIND") {
            self.server.analyzer_bind = v;
        }
        if let Some(v) = lookup("AFFINITY_LOG_JSON").and_then(|v| v.parse().ok()) {
            self.observability.json = v;
        }
    }

    /// Apply CLI overrides (highest priority).
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(ref v) = cli.db_path {
            self.storage.db_path = v.clone();
        }
        if let Some(ref v) = cli.log_path {
            self.transport.log_path = v.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.transport.partitions == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "transport.partitions".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.transport.max_poll_records == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "transport.max_poll_records".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.transport.poll_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "transport.poll_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.transport.user_actions_topic == self.transport.similarity_topic {
            return Err(ConfigError::ValidationFailed {
                field: "transport.similarity_topic".to_string(),
                message: "must differ from transport.user_actions_topic".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}
