//! Configuration loader builder

use super::loading::load_from_source;
use super::merge::merge_values;
use super::types::ConfigSource;
use crate::config::model::ArchiveConfig;
use crate::error::{HinaError, HinaResult};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    pub(super) sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add command line overrides source
    pub fn with_args(self, args: HashMap<String, String>) -> Self {
        self.add_source(ConfigSource::CommandLine(args))
    }

    /// Add default configuration source
    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Merge all sources into a single JSON document
    pub fn load_value(&self) -> HinaResult<Value> {
        let mut merged = serde_json::to_value(ArchiveConfig::default())?;
        for source in &self.sources {
            if let Some(fragment) = load_from_source(source)? {
                merge_values(&mut merged, fragment);
            }
        }
        Ok(merged)
    }

    /// Load and validate configuration from all sources
    pub fn load(self) -> HinaResult<ArchiveConfig> {
        let merged = self.load_value()?;
        let config: ArchiveConfig = serde_json::from_value(merged).map_err(|e| {
            HinaError::config_with_context(
                format!("Invalid configuration value: {}", e),
                "Deserializing merged configuration",
            )
        })?;

        config.validate()?;
        tracing::debug!(
            storage_dir = %config.general.storage_dir.display(),
            persistence = config.general.enable_persistence,
            "configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
