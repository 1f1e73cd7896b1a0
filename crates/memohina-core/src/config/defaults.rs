//! Default configuration loading functions

use crate::config::loader::ConfigLoader;
use crate::config::model::ArchiveConfig;
use crate::error::HinaResult;
use std::collections::HashMap;
use std::path::Path;

/// Default configuration file names probed in the working directory
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["memohina.toml", "memohina.json"];

/// Load configuration with default sources
///
/// 1. Default configuration
/// 2. memohina.toml / memohina.json (if present)
/// 3. Environment variables
pub fn load_config() -> HinaResult<ArchiveConfig> {
    load_config_with_overrides(None, HashMap::new())
}

/// Load configuration with a custom file path
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> HinaResult<ArchiveConfig> {
    load_config_with_overrides(Some(path.as_ref()), HashMap::new())
}

/// Load configuration with command line overrides
///
/// 1. Default configuration
/// 2. Config file (if specified, or default files)
/// 3. Environment variables
/// 4. Command line overrides
pub fn load_config_with_overrides(
    config_file: Option<&Path>,
    overrides: HashMap<String, String>,
) -> HinaResult<ArchiveConfig> {
    let mut loader = ConfigLoader::new().with_defaults();

    match config_file {
        Some(file) => loader = loader.with_file(file),
        None => {
            for name in DEFAULT_CONFIG_FILES {
                loader = loader.with_file(name);
            }
        }
    }

    loader.with_env().with_args(overrides).load()
}
