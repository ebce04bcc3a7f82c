use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::DecisionPolicy;
use crate::rollout::RolloutConfig;

pub mod reload;

pub use reload::ConfigWatcher;

/// Errors that can occur during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Process-wide engine configuration.
///
/// Loaded once at startup and treated as read-only by in-flight
/// evaluations; reconfiguration is an atomic `Arc` swap through the
/// watcher, never a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Version label used to detect config changes on reload
    pub config_version: String,

    pub decision: DecisionPolicy,

    pub rollout: RolloutConfig,

    /// Timeout for the remote risk provider call
    pub provider_timeout_ms: u64,

    /// Weight of the local rule source in v2 aggregation
    pub local_source_weight: f64,

    /// Weight of the remote provider source in v2 aggregation
    pub provider_source_weight: f64,

    /// Failed-attempt count at which the velocity rule triggers
    pub velocity_threshold: u32,

    /// IPs denied outright by the blocklist rule
    pub blocked_ips: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            config_version: "0.0.0".to_string(),
            decision: DecisionPolicy::default(),
            rollout: RolloutConfig::default(),
            provider_timeout_ms: 5000,
            local_source_weight: 1.0,
            provider_source_weight: 1.0,
            velocity_threshold: 5,
            blocked_ips: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.provider_timeout_ms)
    }

    /// Normalize the fail-closed-repairable parts of the config.
    ///
    /// Thresholds and rollout percentages degrade to safe values instead
    /// of failing the load; structural problems still error.
    pub fn normalized(mut self) -> Self {
        self.decision.thresholds = self.decision.thresholds.validated();
        self.rollout = self.rollout.validated();
        self
    }
}

/// Load and validate engine configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EngineConfig = serde_yaml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config.normalized())
}

fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.config_version.is_empty() {
        return Err(ConfigError::Validation(
            "config_version cannot be empty".to_string(),
        ));
    }

    if config.provider_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "provider_timeout_ms must be positive".to_string(),
        ));
    }

    Ok(())
}
