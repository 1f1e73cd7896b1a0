//! Configuration management commands

use super::Context;
use memohina_core::config::ArchiveConfig;
use memohina_core::error::{HinaError, HinaResult};
use std::path::Path;

/// Show the effective configuration with secrets masked
pub async fn show(context: &Context) -> HinaResult<()> {
    let config = context.load_config()?;
    context.console.print_header("Memohina Configuration");
    context.console.info(&format!(
        "Source: {} (merged with defaults, env and overrides)",
        context.config_file.display()
    ));
    let rendered = serde_json::to_string_pretty(&config.redacted())?;
    println!("{}", rendered);
    Ok(())
}

/// Validate the configuration file
pub async fn validate(context: &Context) -> HinaResult<()> {
    let console = &context.console;
    console.info(&format!("Validating {}", context.config_file.display()));

    if !context.config_file.exists() {
        console.warn(&format!(
            "{} not found; validating defaults",
            context.config_file.display()
        ));
    }

    match context.load_config() {
        Ok(config) => {
            console.success("Configuration is valid");
            console.print_field(
                "Storage directory",
                &config.general.storage_dir.display().to_string(),
            );
            console.print_field("Persistence", &config.general.enable_persistence.to_string());
            console.print_field(
                "Export batch",
                &config.export.memohina_export_record_count.to_string(),
            );
            Ok(())
        }
        Err(e) => {
            console.error(&format!("Configuration is invalid: {}", e));
            Err(e)
        }
    }
}

/// Write a default configuration file
pub async fn init(context: &Context, force: bool) -> HinaResult<()> {
    let path = &context.config_file;
    if path.exists() && !force {
        context.console.warn(&format!(
            "{} already exists; use --force to overwrite",
            path.display()
        ));
        return Err(HinaError::io_with_path(
            "configuration file already exists",
            path.display().to_string(),
        ));
    }

    let content = render_default(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;

    context
        .console
        .success(&format!("Created configuration file {}", path.display()));
    Ok(())
}

/// Default configuration in the format implied by the file extension
fn render_default(path: &Path) -> HinaResult<String> {
    let config = ArchiveConfig::default();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(serde_json::to_string_pretty(&config)?),
        _ => toml::to_string_pretty(&config)
            .map_err(|e| HinaError::config(format!("Failed to render TOML: {}", e))),
    }
}
