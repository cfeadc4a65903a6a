use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "stagehand.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reconciler tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilerConfig {
    /// Run same-turn updates of one component as a single diff pass
    #[serde(default)]
    pub coalesce_updates: bool,

    /// Maximum live-tree depth allowed during construction
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum scheduler turns processed by one flush
    #[serde(default = "default_max_flush_turns")]
    pub max_flush_turns: usize,
}

fn default_max_depth() -> usize {
    512
}

fn default_max_flush_turns() -> usize {
    1000
}

impl ReconcilerConfig {
    /// Load `stagehand.config.json` from a directory, or defaults if absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce_updates = coalesce;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            coalesce_updates: false,
            max_depth: default_max_depth(),
            max_flush_turns: default_max_flush_turns(),
        }
    }
}
