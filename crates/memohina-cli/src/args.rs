//! CLI argument definitions using clap
//!
//! - memohina record ...        # Capture one trace
//! - memohina think --user U    # Latest reasoning of a user
//! - memohina export --user U   # Export new records as a snapshot
//! - memohina serve             # NDJSON event loop on stdin/stdout
//! - memohina config ...        # Configuration utilities

use clap::{Parser, Subcommand};

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "memohina.toml";

#[derive(Parser)]
#[command(name = "memohina")]
#[command(about = "Memohina - reasoning trace capture with incremental snapshot export")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,

    /// Override a configuration value, e.g. `--set general.max_think_length=400`
    #[arg(long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("override key must not be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture one reasoning trace
    Record {
        /// User the trace belongs to
        #[arg(long)]
        user: String,

        /// Conversation the trace belongs to
        #[arg(long, default_value = "default")]
        session: String,

        /// The model's reasoning text
        #[arg(long)]
        reasoning: String,

        /// The model's visible response
        #[arg(long, default_value = "")]
        response: String,

        /// The user message that triggered the exchange
        #[arg(long)]
        message: Option<String>,
    },

    /// Show the latest reasoning of a user
    Think {
        #[arg(long)]
        user: String,
    },

    /// Export records added since the last export
    Export {
        #[arg(long)]
        user: String,

        /// Maximum records in the snapshot (defaults to the configured count)
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Read NDJSON events from stdin and answer on stdout
    Serve {
        /// Do not reload the configuration file when it changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration (secrets masked)
    Show,

    /// Validate the configuration file
    Validate,

    /// Create a new configuration file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::try_parse_from([
            "memohina",
            "--set",
            "general.max_think_length=400",
            "think",
            "--user",
            "alice",
        ])
        .unwrap();
        assert_eq!(
            cli.overrides,
            vec![("general.max_think_length".to_string(), "400".to_string())]
        );
        assert!(matches!(cli.command, Commands::Think { ref user } if user == "alice"));
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        assert!(Cli::try_parse_from(["memohina", "--set", "nonsense", "serve"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "memohina",
            "export",
            "--user",
            "u",
            "--max-records",
            "3",
            "--config-file",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.config_file, "other.toml");
        assert!(matches!(
            cli.command,
            Commands::Export {
                max_records: Some(3),
                ..
            }
        ));
    }
}
