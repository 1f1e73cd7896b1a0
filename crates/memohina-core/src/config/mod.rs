//! Configuration management for Memohina
//!
//! Configuration is assembled from layered sources (defaults, a JSON/TOML/YAML
//! file, `MEMOHINA_*` environment variables, command-line overrides), merged as
//! JSON values and validated once at load time. Components read it through a
//! [`ConfigHandle`] so a reload takes effect at their next operation.

mod defaults;
mod env_loader;
mod file_loader;
mod handle;
mod logging_config;
mod model;
mod watcher;

pub mod loader;
pub mod validation;

pub use defaults::{load_config, load_config_from_file, load_config_with_overrides};
pub use handle::ConfigHandle;
pub use loader::{ConfigLoader, ConfigSource};
pub use logging_config::LoggingConfig;
pub use model::{
    ArchiveConfig, CooldownConfig, ExportConfig, GeneralConfig, RemoteConfig, RemoteKind,
    SchedulerConfig,
};
pub use validation::ConfigValidator;
pub use watcher::ConfigWatcher;
