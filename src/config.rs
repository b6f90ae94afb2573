//! Rewrite configuration.
//!
//! A [`RewriteConfig`] controls the two behaviours of a run that are not fixed:
//! what happens to parts that declare no background, and whether images left
//! without references are pruned. It is loaded from YAML:
//!
//! ```yaml
//! missing_background: synthesize
//! prune_orphaned_media: true
//! ```
//!
//! Missing keys keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What to do with a master, layout or slide that has no `p:bg` of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Leave the part without a background; it keeps inheriting one.
    #[default]
    Inherit,
    /// Give the part a transparent background of its own.
    Synthesize,
}

/// Settings for one rewrite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Policy for parts without a background declaration.
    pub missing_background: BackgroundPolicy,

    /// Remove image relationships and media parts nothing references after the rewrite.
    pub prune_orphaned_media: bool,
}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_saphyr::Error),
}

impl RewriteConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Builder-style setter for the missing-background policy.
    pub fn with_missing_background(mut self, policy: BackgroundPolicy) -> Self {
        self.missing_background = policy;
        self
    }

    /// Builder-style setter for orphaned media pruning.
    pub fn with_prune_orphaned_media(mut self, prune: bool) -> Self {
        self.prune_orphaned_media = prune;
        self
    }
}
