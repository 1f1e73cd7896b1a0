//! CLI command implementations

pub mod config;
pub mod export;
pub mod record;
pub mod serve;
pub mod think;

use crate::args::Cli;
use crate::console::CliConsole;
use memohina_core::config::{ArchiveConfig, ConfigHandle, load_config_with_overrides};
use memohina_core::error::HinaResult;
use memohina_core::ArchiveApp;
use std::collections::HashMap;
use std::path::PathBuf;

/// Options shared by every command
pub struct Context {
    pub config_file: PathBuf,
    pub overrides: HashMap<String, String>,
    pub console: CliConsole,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_file: PathBuf::from(&cli.config_file),
            overrides: cli.overrides.iter().cloned().collect(),
            console: CliConsole::new(cli.verbose),
        }
    }

    /// Defaults, then the config file if it exists, then env, then `--set`
    pub fn load_config(&self) -> HinaResult<ArchiveConfig> {
        load_config_with_overrides(Some(&self.config_file), self.overrides.clone())
    }

    /// One-shot app: every record is written through before the command returns
    pub fn build_app(&self, config: ArchiveConfig) -> HinaResult<ArchiveApp> {
        ArchiveApp::builder(ConfigHandle::new(config)).build()
    }
}
