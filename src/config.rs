//! Engine configuration
//!
//! Loaded from YAML or JSON. Every field has a default, so an empty
//! document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;

/// What `untie_from_next` does when the note sits in the last measure
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DanglingTiePolicy {
    /// Fail with `MeasureBoundsExceeded`
    #[default]
    Reject,
    /// Nothing to untie; succeed without changes
    Ignore,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Divisions in one quarter note; the time grid of every measure
    pub divisions_per_quarter: u32,

    pub dangling_ties: DanglingTiePolicy,

    /// Spelling convention used by `Score::normalize_spelling`
    pub prefer_sharps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            divisions_per_quarter: 4,
            dangling_ties: DanglingTiePolicy::Reject,
            prefer_sharps: true,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validated()
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validated()
    }

    /// Load from a file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        log::debug!("loading engine config from {}", path.display());
        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.divisions_per_quarter == 0 {
            return Err(ConfigError::ZeroDivisions);
        }
        Ok(self)
    }
}
