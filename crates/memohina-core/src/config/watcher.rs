//! Configuration hot reload via file system watching

use super::defaults::load_config_with_overrides;
use super::handle::ConfigHandle;
use crate::error::{HinaError, HinaResult};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Reloads the configuration file into a [`ConfigHandle`] when it changes.
///
/// The parent directory is watched so editors that replace the file are seen.
/// A file that fails to parse or validate is rejected and the previous
/// configuration stays active.
pub struct ConfigWatcher {
    #[allow(dead_code)]
    debouncer: Debouncer<RecommendedWatcher>,
    task: JoinHandle<()>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Start watching `path`; must be called inside a tokio runtime
    pub fn spawn(
        handle: ConfigHandle,
        path: impl Into<PathBuf>,
        overrides: HashMap<String, String>,
    ) -> HinaResult<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| HinaError::config(format!("Not a file path: {}", path.display())))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();
        let mut debouncer = new_debouncer(
            Duration::from_millis(500),
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    if events
                        .iter()
                        .any(|e| e.path.file_name() == Some(file_name.as_os_str()))
                    {
                        if let Err(e) = event_tx.send(()) {
                            error!("Failed to send config change event: {}", e);
                        }
                    }
                }
                Err(e) => error!("Config watcher error: {}", e),
            },
        )
        .map_err(|e| HinaError::config(format!("Failed to create file watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| HinaError::config(format!("Failed to watch {}: {}", dir.display(), e)))?;
        info!("Watching configuration file: {}", path.display());

        let reload_path = path.clone();
        let task = tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                reload(&handle, &reload_path, &overrides);
            }
            debug!("Config watcher stopped");
        });

        Ok(Self {
            debouncer,
            task,
            path,
        })
    }

    /// Watched file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn reload(handle: &ConfigHandle, path: &Path, overrides: &HashMap<String, String>) {
    match load_config_with_overrides(Some(path), overrides.clone()) {
        Ok(config) => match handle.replace(config) {
            Ok(()) => info!("Configuration reloaded from {}", path.display()),
            Err(e) => warn!("Rejected reloaded configuration: {}", e),
        },
        Err(e) => warn!(
            "Keeping previous configuration, reload of {} failed: {}",
            path.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reload_applies_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memohina.toml");
        std::fs::write(&path, "[general]\nmax_think_length = 64\n").unwrap();

        let handle = ConfigHandle::default();
        reload(&handle, &path, &HashMap::new());
        assert_eq!(handle.snapshot().general.max_think_length, 64);
    }

    #[test]
    fn test_reload_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memohina.toml");
        std::fs::write(&path, "[general]\nlog_rotation_count = 0\n").unwrap();

        let handle = ConfigHandle::default();
        reload(&handle, &path, &HashMap::new());
        assert_eq!(handle.snapshot().general.log_rotation_count, 20);
    }
}
