//! Wiring of the archive components

use crate::commands::ThoughtCommands;
use crate::config::ConfigHandle;
use crate::cooldown::CooldownGuard;
use crate::cursor::CursorCache;
use crate::error::HinaResult;
use crate::export::{IncrementalExporter, RemoteArchive, archive_from_config};
use crate::render::QrRenderer;
use crate::scheduler::ActivityScheduler;
use crate::store::RecordStore;
use std::sync::Arc;
use tracing::info;

/// Builder for [`ArchiveApp`]
pub struct ArchiveAppBuilder {
    config: ConfigHandle,
    remote: Option<Arc<dyn RemoteArchive>>,
    renderer: Option<Arc<dyn QrRenderer>>,
    background_flush: bool,
}

impl ArchiveAppBuilder {
    /// Use this archive instead of the configured one
    pub fn remote(mut self, remote: Arc<dyn RemoteArchive>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn QrRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Buffer records and flush them from per-user activity loops.
    ///
    /// Without it every record is written as it arrives, which suits one-shot
    /// processes.
    pub fn background_flush(mut self, enabled: bool) -> Self {
        self.background_flush = enabled;
        self
    }

    pub fn build(self) -> HinaResult<ArchiveApp> {
        let snapshot = self.config.snapshot();
        snapshot.validate()?;

        let remote = match self.remote {
            Some(remote) => remote,
            None => archive_from_config(&snapshot)?,
        };

        let store = Arc::new(
            RecordStore::new(self.config.clone()).with_write_through(!self.background_flush),
        );
        let cursors = Arc::new(CursorCache::new(store.clone(), self.config.clone()));
        let cooldowns = Arc::new(CooldownGuard::new(self.config.clone()));
        let exporter = Arc::new(IncrementalExporter::new(
            store.clone(),
            cursors.clone(),
            remote.clone(),
            self.config.clone(),
        ));

        let mut commands =
            ThoughtCommands::new(store.clone(), cooldowns, exporter, self.config.clone());
        let scheduler = if self.background_flush {
            let scheduler = ActivityScheduler::new(store.clone(), self.config.clone());
            commands = commands.with_scheduler(scheduler.clone());
            Some(scheduler)
        } else {
            None
        };
        if let Some(renderer) = self.renderer {
            commands = commands.with_renderer(renderer);
        }

        info!(
            storage_dir = %store.root().display(),
            remote = remote.name(),
            background_flush = self.background_flush,
            "archive ready"
        );

        Ok(ArchiveApp {
            config: self.config,
            store,
            cursors,
            scheduler,
            commands,
        })
    }
}

/// A fully wired archive: store, cursors, cooldowns, scheduler and exporter
pub struct ArchiveApp {
    config: ConfigHandle,
    store: Arc<RecordStore>,
    cursors: Arc<CursorCache>,
    scheduler: Option<ActivityScheduler>,
    commands: ThoughtCommands,
}

impl ArchiveApp {
    pub fn builder(config: ConfigHandle) -> ArchiveAppBuilder {
        ArchiveAppBuilder {
            config,
            remote: None,
            renderer: None,
            background_flush: false,
        }
    }

    pub fn commands(&self) -> &ThoughtCommands {
        &self.commands
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn cursors(&self) -> &Arc<CursorCache> {
        &self.cursors
    }

    pub fn scheduler(&self) -> Option<&ActivityScheduler> {
        self.scheduler.as_ref()
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Stop background loops and write everything still buffered
    pub async fn shutdown(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown().await;
        }
        let written = self.store.flush_all().await;
        let cursors = self.cursors.stats();
        info!(
            written,
            cursor_hit_rate = cursors.hit_rate(),
            cursor_evictions = cursors.evictions,
            "archive shut down"
        );
    }
}
