//! Shared, reloadable configuration

use super::model::ArchiveConfig;
use crate::error::HinaResult;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared handle to the active configuration.
///
/// Components call [`ConfigHandle::snapshot`] at the start of every operation,
/// so a replacement takes effect at their next operation without restarts.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<ArchiveConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: ArchiveConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current configuration
    pub fn snapshot(&self) -> Arc<ArchiveConfig> {
        self.inner.read().clone()
    }

    /// Replace the configuration after validating it; the old one stays on error
    pub fn replace(&self, config: ArchiveConfig) -> HinaResult<()> {
        config.validate()?;
        *self.inner.write() = Arc::new(config);
        Ok(())
    }

    /// Apply an in-place change and validate the result
    pub fn update<F>(&self, change: F) -> HinaResult<()>
    where
        F: FnOnce(&mut ArchiveConfig),
    {
        let mut next = (*self.snapshot()).clone();
        change(&mut next);
        self.replace(next)
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(ArchiveConfig::default())
    }
}
