//! Configuration validation
//!
//! Every check runs at load time so a bad value is reported before any
//! component starts using it.

use crate::config::logging_config::LoggingConfig;
use crate::config::model::{ArchiveConfig, RemoteKind};
use crate::error::{HinaError, HinaResult};
use crate::render::ModuleShape;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &ArchiveConfig) -> HinaResult<()> {
        Self::validate_general(config)?;
        Self::validate_scheduler(config)?;
        Self::validate_cooldown(config)?;
        Self::validate_export(config)?;
        Self::validate_remote(config)?;
        Self::validate_qrcode(config)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_general(config: &ArchiveConfig) -> HinaResult<()> {
        let general = &config.general;
        if general.storage_dir.as_os_str().is_empty() {
            return Err(invalid("general.storage_dir", "must not be empty"));
        }
        if general.max_think_length == 0 {
            return Err(invalid("general.max_think_length", "must be at least 1"));
        }
        if general.log_rotation_count == 0 {
            return Err(invalid("general.log_rotation_count", "must be at least 1"));
        }
        if general.upload_cache_size == 0 {
            return Err(invalid("general.upload_cache_size", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_scheduler(config: &ArchiveConfig) -> HinaResult<()> {
        let scheduler = &config.scheduler;
        if scheduler.save_interval_seconds == 0 {
            return Err(invalid("scheduler.save_interval_seconds", "must be at least 1"));
        }
        if scheduler.user_inactivity_timeout_seconds == 0 {
            return Err(invalid(
                "scheduler.user_inactivity_timeout_seconds",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn validate_cooldown(config: &ArchiveConfig) -> HinaResult<()> {
        if config.cooldown.capacity == 0 {
            return Err(invalid("cooldown.capacity", "must be at least 1"));
        }
        Ok(())
    }

    fn validate_export(config: &ArchiveConfig) -> HinaResult<()> {
        let export = &config.export;
        if export.memohina_export_record_count == 0 {
            return Err(invalid(
                "export.memohina_export_record_count",
                "must be at least 1",
            ));
        }
        let prefix = export.key_prefix.as_str();
        if prefix.is_empty()
            || prefix.starts_with('/')
            || prefix.ends_with('/')
            || prefix.split('/').any(|p| p.is_empty() || p == "." || p == "..")
        {
            return Err(invalid(
                "export.key_prefix",
                format!("'{}' is not a relative object key prefix", prefix),
            ));
        }
        Ok(())
    }

    fn validate_remote(config: &ArchiveConfig) -> HinaResult<()> {
        let remote = &config.remote;
        if remote.timeout_seconds == 0 {
            return Err(invalid("remote.timeout_seconds", "must be at least 1"));
        }
        if remote.kind == RemoteKind::Http {
            let endpoint = remote.endpoint.as_deref().unwrap_or_default();
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(invalid(
                    "remote.endpoint",
                    "an http(s) endpoint is required for the http archive",
                ));
            }
            if remote.bucket.as_deref().is_none_or(str::is_empty) {
                return Err(invalid("remote.bucket", "required for the http archive"));
            }
        }
        Ok(())
    }

    fn validate_qrcode(config: &ArchiveConfig) -> HinaResult<()> {
        let qr = &config.qrcode;
        if !(1..=100).contains(&qr.box_size) {
            return Err(invalid("qrcode.box_size", "must be between 1 and 100"));
        }
        if qr.border > 50 {
            return Err(invalid("qrcode.border", "must be at most 50"));
        }
        if ModuleShape::parse(&qr.module_shape).is_none() {
            tracing::warn!(
                shape = %qr.module_shape,
                "unknown QR module shape, falling back to square"
            );
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> HinaResult<()> {
        if !LoggingConfig::LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(invalid(
                "logging.level",
                format!("unknown level '{}'", logging.level),
            ));
        }
        if !LoggingConfig::FORMATS.contains(&logging.format.to_lowercase().as_str()) {
            return Err(invalid(
                "logging.format",
                format!("unknown format '{}'", logging.format),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl std::fmt::Display) -> HinaError {
    HinaError::config_with_context(format!("{} {}", field, message), field.to_string())
}
