//! Configuration data model

use super::logging_config::LoggingConfig;
use crate::commands::CommandKind;
use crate::render::QrStyleConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory name used when no platform data directory is available
pub const FALLBACK_STORAGE_DIR: &str = "hina_thoughts_data";

/// Complete Memohina configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    pub general: GeneralConfig,
    pub scheduler: SchedulerConfig,
    pub cooldown: CooldownConfig,
    pub export: ExportConfig,
    pub remote: RemoteConfig,
    pub qrcode: QrStyleConfig,
    pub logging: LoggingConfig,
}

impl ArchiveConfig {
    /// Validate this configuration
    pub fn validate(&self) -> crate::error::HinaResult<()> {
        super::validation::ConfigValidator::validate(self)
    }

    /// Copy of this configuration with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.remote.token.is_some() {
            copy.remote.token = Some("********".to_string());
        }
        copy
    }
}

/// Storage and display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Write records, cursors and the latest-record cache to disk
    pub enable_persistence: bool,
    /// Root directory for per-user logs and `/think` exports
    pub storage_dir: PathBuf,
    /// Maximum characters of reasoning shown by `/think`
    pub max_think_length: usize,
    /// Records per segment file before rotating
    pub log_rotation_count: usize,
    /// Segments kept per user; 0 keeps everything
    pub retention_segments: usize,
    /// Never delete a segment that still holds unexported records
    pub protect_unexported: bool,
    /// Export cursors kept in memory
    pub upload_cache_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let storage_dir = dirs::data_dir()
            .map(|d| d.join("memohina"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_STORAGE_DIR));
        Self {
            enable_persistence: true,
            storage_dir,
            max_think_length: 800,
            log_rotation_count: 20,
            retention_segments: 50,
            protect_unexported: false,
            upload_cache_size: 1000,
        }
    }
}

/// Background flush scheduling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub save_interval_seconds: u64,
    pub user_inactivity_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            save_interval_seconds: 60,
            user_inactivity_timeout_seconds: 300,
        }
    }
}

impl SchedulerConfig {
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_seconds)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.user_inactivity_timeout_seconds)
    }
}

/// Per-command cooldowns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CooldownConfig {
    pub think_seconds: u64,
    pub memohina_seconds: u64,
    /// Maximum (user, command) entries remembered
    pub capacity: usize,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            think_seconds: 10,
            memohina_seconds: 600,
            capacity: 10_000,
        }
    }
}

impl CooldownConfig {
    /// Cooldown applied to a command
    pub fn seconds_for(&self, command: CommandKind) -> u64 {
        match command {
            CommandKind::Think => self.think_seconds,
            CommandKind::Memohina => self.memohina_seconds,
        }
    }
}

/// Snapshot export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum records per snapshot
    pub memohina_export_record_count: usize,
    /// First segment of every remote key
    pub key_prefix: String,
    /// Gzip snapshot bodies
    pub compress: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            memohina_export_record_count: 200,
            key_prefix: "memory".to_string(),
            compress: false,
        }
    }
}

/// Remote archive backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    #[default]
    Local,
    Http,
}

/// Remote archive settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub kind: RemoteKind,
    /// Target directory for the local archive (defaults to `<storage_dir>/archive`)
    pub local_dir: Option<PathBuf>,
    /// Base URL handed out for locally archived snapshots
    pub public_base_url: Option<String>,
    /// Object store endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    /// Custom public domain serving the bucket
    pub public_domain: Option<String>,
    /// Bearer token for uploads
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            kind: RemoteKind::Local,
            local_dir: None,
            public_base_url: None,
            endpoint: None,
            bucket: None,
            public_domain: None,
            token: None,
            timeout_seconds: 10,
        }
    }
}
