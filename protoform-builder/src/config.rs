//! Builder configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// What `merge_snapshot` does with empty strings, sequences and mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyValuePolicy {
    /// Treat the key as absent.
    #[default]
    Skip,
    /// Fail with `BuildError::EmptyValue`.
    Reject,
}

/// Builder configuration, loadable from TOML:
///
/// ```toml
/// max_depth = 32
/// empty_values = "reject"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Maximum nesting of callback scopes and snapshot payloads.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub empty_values: EmptyValuePolicy,
}

fn default_max_depth() -> usize {
    64
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            empty_values: EmptyValuePolicy::default(),
        }
    }
}

impl BuilderConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded builder config from {:?}", path);
        Ok(config)
    }
}
