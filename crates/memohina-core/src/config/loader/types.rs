//! Configuration source types

use std::collections::HashMap;
use std::path::PathBuf;

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Configuration from a file (JSON, TOML or YAML by extension)
    File(PathBuf),
    /// `MEMOHINA_<SECTION>__<FIELD>` environment variables
    Environment,
    /// Dotted-path overrides, e.g. `general.max_think_length=400`
    CommandLine(HashMap<String, String>),
    /// Built-in defaults
    Default,
}
