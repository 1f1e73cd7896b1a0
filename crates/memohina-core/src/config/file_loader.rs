//! File-based configuration loading

use crate::error::{HinaError, HinaResult};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a configuration file as a JSON fragment
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns `None` if the file doesn't exist.
pub fn load_from_file(path: &Path) -> HinaResult<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        HinaError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            HinaError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            HinaError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            HinaError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(Some(value))
}
