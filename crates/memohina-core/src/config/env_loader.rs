//! Environment variable-based configuration loading

use super::loader::set_nested_value;
use super::loader::merge::parse_scalar;
use serde_json::Value;

/// Prefix of configuration variables
pub const ENV_PREFIX: &str = "MEMOHINA_";

/// Load configuration overrides from the process environment
///
/// `MEMOHINA_GENERAL__MAX_THINK_LENGTH=400` sets `general.max_think_length`.
pub fn load_from_env() -> Option<Value> {
    load_from_vars(std::env::vars())
}

pub(crate) fn load_from_vars<I>(vars: I) -> Option<Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut fragment = Value::Object(serde_json::Map::new());
    let mut found = false;

    for (key, raw) in vars {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        if !rest.contains("__") {
            continue;
        }
        let path = rest.to_lowercase().replace("__", ".");
        set_nested_value(&mut fragment, &path, parse_scalar(&raw));
        found = true;
    }

    found.then_some(fragment)
}
