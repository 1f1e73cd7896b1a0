//! Command surface for a chat host
//!
//! [`ThoughtCommands`] is what a host dispatcher talks to: the ingest hook
//! for new traces plus the `/think` and `/memohina` commands. Cooldown
//! denials come back as `CooldownDenied` and must not be answered.

mod kind;
mod reply;
mod think;


pub use kind::CommandKind;
pub use reply::{CommandOutput, ExportReply, ThinkReply};

use crate::config::ConfigHandle;
use crate::cooldown::CooldownGuard;
use crate::error::{ExportError, PersistenceError};
use crate::export::IncrementalExporter;
use crate::render::QrRenderer;
use crate::scheduler::ActivityScheduler;
use crate::store::RecordStore;
use crate::types::{NewThought, ThoughtRecord, UserKey};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Ingest hook and user commands
pub struct ThoughtCommands {
    store: Arc<RecordStore>,
    scheduler: Option<ActivityScheduler>,
    cooldowns: Arc<CooldownGuard>,
    exporter: Arc<IncrementalExporter>,
    renderer: Option<Arc<dyn QrRenderer>>,
    config: ConfigHandle,
}

impl ThoughtCommands {
    pub fn new(
        store: Arc<RecordStore>,
        cooldowns: Arc<CooldownGuard>,
        exporter: Arc<IncrementalExporter>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            store,
            scheduler: None,
            cooldowns,
            exporter,
            renderer: None,
            config,
        }
    }

    /// Flush through the scheduler instead of relying on write-through
    pub fn with_scheduler(mut self, scheduler: ActivityScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn QrRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Capture a finished exchange.
    ///
    /// The user's flush loop is kept alive even when the write fails, so
    /// buffered records get another chance.
    pub async fn record_thought(
        &self,
        thought: NewThought,
    ) -> Result<ThoughtRecord, PersistenceError> {
        let user_id = thought.user_id.clone();
        let result = self.store.append(thought).await;
        if let Some(scheduler) = &self.scheduler {
            scheduler.touch(&user_id);
        }
        result
    }

    /// `/think`: the most recent reasoning of a user
    pub async fn show_latest(&self, user_id: &str, now: DateTime<Utc>) -> ThinkReply {
        if !self.cooldowns.allow(user_id, CommandKind::Think, now).is_allowed() {
            return ThinkReply::CooldownDenied;
        }
        let Some(record) = self.store.latest(user_id).await else {
            return ThinkReply::Empty;
        };

        let config = self.config.snapshot();
        let (text, truncated) = think::truncate_chars(&record.reasoning_text, config.general.max_think_length);

        let full_export = if config.general.enable_persistence {
            let dir = self.store.think_dir(&UserKey::from_user_id(user_id));
            match think::export_full_record(&dir, &record, now).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("failed to export full reasoning: {}", e);
                    None
                }
            }
        } else {
            None
        };

        ThinkReply::Latest {
            sequence_no: record.sequence_no,
            text,
            truncated,
            full_export,
        }
    }

    /// `/memohina`: export everything new since the last snapshot
    pub async fn export_incremental(&self, user_id: &str, now: DateTime<Utc>) -> ExportReply {
        if !self.cooldowns.allow(user_id, CommandKind::Memohina, now).is_allowed() {
            return ExportReply::CooldownDenied;
        }

        let outcome = match self.exporter.export_default(user_id).await {
            Ok(outcome) => outcome,
            Err(ExportError::NothingToExport) => return ExportReply::NothingToExport,
            Err(e) => {
                warn!(user_key = %UserKey::from_user_id(user_id), "export failed: {}", e);
                return ExportReply::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let qr_image = self.render_qr(&outcome.url).await;
        ExportReply::Exported {
            url: outcome.url,
            record_count: outcome.record_count,
            from_seq: outcome.from_seq,
            to_seq: outcome.to_seq,
            qr_image,
        }
    }

    async fn render_qr(&self, url: &str) -> Option<Vec<u8>> {
        let renderer = self.renderer.as_ref()?;
        let config = self.config.snapshot();
        let style = config
            .qrcode
            .resolve(Duration::from_secs(config.remote.timeout_seconds))
            .await;
        match renderer.render(url, &style).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Run a command by name or alias; `None` for unknown names
    pub async fn invoke(&self, user_id: &str, name: &str) -> Option<CommandOutput> {
        let kind = CommandKind::parse(name)?;
        let now = Utc::now();
        let output = match kind {
            CommandKind::Think => CommandOutput::Think(self.show_latest(user_id, now).await),
            CommandKind::Memohina => {
                CommandOutput::Memohina(self.export_incremental(user_id, now).await)
            }
        };
        if !output.is_silent() {
            info!(command = %kind, user_key = %UserKey::from_user_id(user_id), "command handled");
        }
        Some(output)
    }
}
