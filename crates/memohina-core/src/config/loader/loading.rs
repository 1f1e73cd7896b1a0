//! Configuration source loading logic

use super::merge::{parse_scalar, set_nested_value};
use super::types::ConfigSource;
use crate::config::env_loader;
use crate::config::file_loader;
use crate::config::model::ArchiveConfig;
use crate::error::HinaResult;
use serde_json::Value;

/// Load one source as a JSON fragment; `None` means the source contributes nothing
pub(super) fn load_from_source(source: &ConfigSource) -> HinaResult<Option<Value>> {
    match source {
        ConfigSource::File(path) => {
            tracing::debug!("Loading config from file: {}", path.display());
            file_loader::load_from_file(path)
        }
        ConfigSource::Environment => {
            tracing::debug!("Loading config from environment");
            Ok(env_loader::load_from_env())
        }
        ConfigSource::CommandLine(args) => {
            tracing::debug!("Loading config from command line");
            if args.is_empty() {
                return Ok(None);
            }
            let mut fragment = Value::Object(serde_json::Map::new());
            for (path, raw) in args {
                set_nested_value(&mut fragment, path, parse_scalar(raw));
            }
            Ok(Some(fragment))
        }
        ConfigSource::Default => {
            tracing::debug!("Loading default config");
            Ok(Some(serde_json::to_value(ArchiveConfig::default())?))
        }
    }
}
