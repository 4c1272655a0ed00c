use std::path::Path;

use thiserror::Error;

use crate::reconcile::ReconcilePolicy;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How descendants are reconciled after an ancestor change. Applies to
    /// every filter of the engine.
    pub policy: ReconcilePolicy,
    /// Whether identical provider calls are deduplicated through the options
    /// cache.
    pub cache_options: bool,
    /// Values outside the filter graph that providers depend on (user id,
    /// date range, ...). Part of every cache key.
    pub extra_dependencies: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::KeepIfValid,
            cache_options: true,
            extra_dependencies: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let f = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(f)?)
    }
}
