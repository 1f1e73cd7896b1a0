//! Cursor-driven incremental exporter

use super::remote::RemoteArchive;
use super::snapshot::{Snapshot, encode_snapshot, snapshot_key};
use crate::config::ConfigHandle;
use crate::cursor::CursorCache;
use crate::error::ExportError;
use crate::store::RecordStore;
use crate::types::{ExportCursor, SequenceNo, UserKey};
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// A committed export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub url: String,
    pub key: String,
    pub record_count: usize,
    /// Cursor the batch was read after (exclusive)
    pub from_seq: SequenceNo,
    /// Last included record; the new cursor
    pub to_seq: SequenceNo,
}

/// Reads after the cursor, uploads a snapshot, then commits the cursor
pub struct IncrementalExporter {
    store: Arc<RecordStore>,
    cursors: Arc<CursorCache>,
    remote: Arc<dyn RemoteArchive>,
    config: ConfigHandle,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IncrementalExporter {
    pub fn new(
        store: Arc<RecordStore>,
        cursors: Arc<CursorCache>,
        remote: Arc<dyn RemoteArchive>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            store,
            cursors,
            remote,
            config,
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Export with the configured batch size
    pub async fn export_default(&self, user_id: &str) -> Result<ExportOutcome, ExportError> {
        let max_records = self.config.snapshot().export.memohina_export_record_count;
        self.export(user_id, max_records).await
    }

    /// Export at most `max_records` records after the user's cursor.
    ///
    /// Exports of one user run one at a time; the cursor only moves after the
    /// upload succeeded and the new cursor is durable. If that final write
    /// fails the uploaded snapshot is orphaned and the next export covers the
    /// same records again.
    #[instrument(level = "debug", skip_all, fields(user_key = %UserKey::from_user_id(user_id)))]
    pub async fn export(
        &self,
        user_id: &str,
        max_records: usize,
    ) -> Result<ExportOutcome, ExportError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let config = self.config.snapshot();
        let cursor = self.cursors.get(user_id).await?;
        let from_seq = cursor.last_exported_sequence_no;

        // Only records already on disk are exported; a failed flush fails the export.
        let records = self
            .store
            .read_durable_since(user_id, from_seq)
            .await?
            .take(max_records.max(1))
            .await?;

        let generated_at = Utc::now();
        let Some(snapshot) = Snapshot::new(user_id, from_seq, records, generated_at) else {
            return Err(ExportError::NothingToExport);
        };

        let compress = config.export.compress;
        let key = snapshot_key(&config.export.key_prefix, &snapshot, compress);
        let body = encode_snapshot(&snapshot, compress)?;

        let url = match self.remote.put(&key, body).await {
            Ok(url) => url,
            Err(e) => {
                warn!(key = %key, backend = self.remote.name(), "snapshot upload failed: {}", e);
                return Err(e.into());
            }
        };

        let to_seq = snapshot.to_seq;
        self.cursors
            .set(ExportCursor::committed(user_id, to_seq, generated_at, url.clone()))
            .await?;

        info!(
            key = %key,
            from_seq,
            to_seq,
            records = snapshot.record_count,
            "snapshot exported"
        );
        Ok(ExportOutcome {
            url,
            key,
            record_count: snapshot.record_count,
            from_seq,
            to_seq,
        })
    }
}
