//! Per-user append-only record store

use super::files::{read_json_opt, write_json_atomic};
use super::reader::SinceReader;
use super::rotation::enforce_retention;
use super::segment::{ActiveSegment, SegmentInfo, append_records, list_segments, read_segment};
use crate::config::{ArchiveConfig, ConfigHandle};
use crate::error::PersistenceError;
use crate::types::{ExportCursor, NewThought, SequenceNo, ThoughtRecord, UserKey};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SESSION_DIR: &str = "session";
const THINK_DIR: &str = "think";
const LATEST_FILE: &str = "latest.json";
const CURSOR_FILE: &str = "cursor.json";

/// Mutable per-user state, guarded by the user's lock
#[derive(Debug)]
struct UserLog {
    key: UserKey,
    /// On-disk state has been scanned since the last failure
    loaded: bool,
    /// Last assigned sequence number
    head: SequenceNo,
    active: Option<ActiveSegment>,
    /// Assigned but not yet written
    pending: Vec<ThoughtRecord>,
}

impl UserLog {
    fn new(user_id: &str) -> Self {
        Self {
            key: UserKey::from_user_id(user_id),
            loaded: false,
            head: 0,
            active: None,
            pending: Vec::new(),
        }
    }
}

/// Append-only store of [`ThoughtRecord`]s, one rotated log per user.
///
/// Appends and cursor writes for the same user are serialized by a per-user
/// lock; different users never contend. Records are buffered in memory and
/// written by [`RecordStore::flush`], which the activity scheduler calls on a
/// timer. With write-through enabled every append is flushed immediately.
///
/// The most recent record per user is also kept in memory and updated before
/// any disk work, so `/think` keeps working while the disk is failing.
pub struct RecordStore {
    root: PathBuf,
    config: ConfigHandle,
    write_through: bool,
    users: DashMap<String, Arc<Mutex<UserLog>>>,
    latest: DashMap<String, ThoughtRecord>,
}

impl RecordStore {
    /// Create a buffered store rooted at the configured `storage_dir`.
    ///
    /// The root is fixed for the life of the store; the remaining settings are
    /// read on every operation.
    pub fn new(config: ConfigHandle) -> Self {
        let root = config.snapshot().general.storage_dir.clone();
        Self {
            root,
            config,
            write_through: false,
            users: DashMap::new(),
            latest: DashMap::new(),
        }
    }

    /// Flush on every append instead of waiting for the scheduler
    pub fn with_write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a user's segments
    pub fn user_dir(&self, key: &UserKey) -> PathBuf {
        self.root.join(SESSION_DIR).join(key.as_str())
    }

    /// Directory for full `/think` exports of a user
    pub fn think_dir(&self, key: &UserKey) -> PathBuf {
        self.root.join(THINK_DIR).join(key.as_str())
    }

    fn cursor_path(&self, key: &UserKey) -> PathBuf {
        self.user_dir(key).join(CURSOR_FILE)
    }

    fn latest_path(&self, key: &UserKey) -> PathBuf {
        self.user_dir(key).join(LATEST_FILE)
    }

    fn user_entry(&self, user_id: &str) -> Arc<Mutex<UserLog>> {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserLog::new(user_id))))
            .clone()
    }

    /// Number of users with in-memory state
    pub fn tracked_users(&self) -> usize {
        self.users.len()
    }

    /// Assign the next sequence number and append the record.
    ///
    /// The latest-record view is updated even when the write fails. If the
    /// user's log cannot be read at all, the record is kept only in that view
    /// with `sequence_no` 0 and the error is returned.
    #[instrument(level = "debug", skip_all, fields(user_key = %UserKey::from_user_id(&thought.user_id)))]
    pub async fn append(&self, thought: NewThought) -> Result<ThoughtRecord, PersistenceError> {
        let config = self.config.snapshot();
        let user_id = thought.user_id.clone();
        let entry = self.user_entry(&user_id);
        let mut log = entry.lock().await;

        if config.general.enable_persistence {
            if let Err(e) = self.ensure_loaded(&mut log).await {
                warn!(user = %log.key, "cannot open record log: {}", e);
                self.latest.insert(user_id, thought.into_record(0));
                return Err(e);
            }
        }

        log.head += 1;
        let record = thought.into_record(log.head);
        self.latest.insert(user_id, record.clone());

        if !config.general.enable_persistence {
            return Ok(record);
        }

        log.pending.push(record.clone());
        debug!(user = %log.key, seq = record.sequence_no, "record buffered");

        if self.write_through {
            self.flush_locked(&mut log, &config).await?;
        }
        Ok(record)
    }

    /// Write a user's buffered records; returns how many were written.
    ///
    /// Records that could not be written stay buffered for the next flush.
    #[instrument(level = "debug", skip_all, fields(user_key = %UserKey::from_user_id(user_id)))]
    pub async fn flush(&self, user_id: &str) -> Result<usize, PersistenceError> {
        let Some(entry) = self.users.get(user_id).map(|e| e.value().clone()) else {
            return Ok(0);
        };
        let config = self.config.snapshot();
        let mut log = entry.lock().await;
        self.flush_locked(&mut log, &config).await
    }

    /// Flush every user; failures are logged and the remaining users still flushed
    pub async fn flush_all(&self) -> usize {
        let users: Vec<String> = self.users.iter().map(|e| e.key().clone()).collect();
        let mut written = 0;
        for user_id in users {
            match self.flush(&user_id).await {
                Ok(n) => written += n,
                Err(e) => warn!(user = %UserKey::from_user_id(&user_id), "flush failed: {}", e),
            }
        }
        written
    }

    async fn flush_locked(
        &self,
        log: &mut UserLog,
        config: &ArchiveConfig,
    ) -> Result<usize, PersistenceError> {
        if log.pending.is_empty() || !config.general.enable_persistence {
            return Ok(0);
        }
        self.ensure_loaded(log).await?;
        if log.pending.is_empty() {
            return Ok(0);
        }

        let dir = self.user_dir(&log.key);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistenceError::io("create", &dir, e))?;

        let rotation = config.general.log_rotation_count.max(1);
        let mut written = 0;
        let mut rotated = false;
        let mut failure = None;

        while written < log.pending.len() {
            let needs_new = log.active.as_ref().is_none_or(|a| a.count >= rotation);
            if needs_new {
                let first_seq = log.pending[written].sequence_no;
                let info = SegmentInfo::new(&dir, first_seq);
                debug!(user = %log.key, segment = %info.path.display(), "starting segment");
                log.active = Some(ActiveSegment {
                    info,
                    count: 0,
                    torn_tail: false,
                });
                rotated = true;
            }

            let Some(active) = log.active.as_mut() else {
                break;
            };
            let room = rotation - active.count;
            let end = (written + room).min(log.pending.len());
            let batch = &log.pending[written..end];

            if let Err(e) = append_records(active, batch).await {
                failure = Some(e);
                break;
            }
            active.count += batch.len();
            active.torn_tail = false;
            written = end;
        }

        let last_written = written.checked_sub(1).map(|i| log.pending[i].clone());
        log.pending.drain(..written);

        if let Some(e) = failure {
            // Rescan before the next write; a partial append may have left a torn line.
            log.loaded = false;
            log.active = None;
            warn!(
                user = %log.key,
                written,
                buffered = log.pending.len(),
                "flush interrupted: {}",
                e
            );
            return Err(e);
        }

        if let Some(record) = last_written {
            if let Err(e) = write_json_atomic(&self.latest_path(&log.key), &record).await {
                warn!(user = %log.key, "failed to update latest record file: {}", e);
            }
        }

        if rotated {
            let retention = &config.general;
            if let Err(e) = enforce_retention(
                &dir,
                &self.cursor_path(&log.key),
                retention.retention_segments,
                retention.protect_unexported,
            )
            .await
            {
                warn!(user = %log.key, "retention pass failed: {}", e);
            }
        }

        debug!(user = %log.key, written, "flushed records");
        Ok(written)
    }

    /// Recover head and active segment from disk once per user
    async fn ensure_loaded(&self, log: &mut UserLog) -> Result<(), PersistenceError> {
        if log.loaded {
            return Ok(());
        }

        let dir = self.user_dir(&log.key);
        let segments = list_segments(&dir).await?;
        let mut disk_head = 0;

        if let Some(newest) = segments.last() {
            let content = read_segment(&newest.path).await?;
            disk_head = content
                .records
                .iter()
                .map(|r| r.sequence_no)
                .max()
                .unwrap_or(newest.first_seq.saturating_sub(1));
            if content.torn_tail {
                warn!(segment = %newest.path.display(), "segment ends with a partial record");
            }
            log.active = Some(ActiveSegment {
                info: newest.clone(),
                count: content.records.len(),
                torn_tail: content.torn_tail,
            });
        } else {
            log.active = None;
        }

        // Records already on disk from an interrupted flush must not be written twice.
        log.pending.retain(|r| r.sequence_no > disk_head);

        // Sequence numbers at or below the export cursor are never handed out again.
        let exported = match read_json_opt::<ExportCursor>(&self.cursor_path(&log.key)).await {
            Ok(cursor) => cursor.map_or(0, |c| c.last_exported_sequence_no),
            Err(e) => {
                warn!(user = %log.key, "ignoring unreadable export cursor: {}", e);
                0
            }
        };
        if exported > disk_head {
            warn!(
                user = %log.key,
                disk_head,
                exported,
                "export cursor is ahead of the record log"
            );
        }

        let recovered = disk_head.max(exported);
        if recovered > log.head {
            info!(user = %log.key, head = recovered, "recovered record log");
        }
        log.head = log.head.max(recovered);
        log.loaded = true;
        Ok(())
    }

    /// Last assigned sequence number, 0 for a user without records
    pub async fn head(&self, user_id: &str) -> Result<SequenceNo, PersistenceError> {
        let entry = self.user_entry(user_id);
        let mut log = entry.lock().await;
        if self.config.snapshot().general.enable_persistence {
            self.ensure_loaded(&mut log).await?;
        }
        Ok(log.head)
    }

    /// Open a reader over records with `sequence_no > after`.
    ///
    /// The reader sees every record appended before this call, flushed or not.
    #[instrument(level = "debug", skip_all, fields(user_key = %UserKey::from_user_id(user_id)))]
    pub async fn read_since(
        &self,
        user_id: &str,
        after: SequenceNo,
    ) -> Result<SinceReader, PersistenceError> {
        if !self.config.snapshot().general.enable_persistence {
            return Ok(SinceReader::empty(after));
        }

        let entry = self.user_entry(user_id);
        let mut log = entry.lock().await;
        self.ensure_loaded(&mut log).await?;
        self.reader_locked(&log, after).await
    }

    /// Write the user's buffered records, then open a reader after `after`.
    ///
    /// Both steps run under the user's lock, so the reader only yields records
    /// that are already on disk. An export cursor built from it can never run
    /// ahead of the recoverable log.
    #[instrument(level = "debug", skip_all, fields(user_key = %UserKey::from_user_id(user_id)))]
    pub async fn read_durable_since(
        &self,
        user_id: &str,
        after: SequenceNo,
    ) -> Result<SinceReader, PersistenceError> {
        let config = self.config.snapshot();
        if !config.general.enable_persistence {
            return Ok(SinceReader::empty(after));
        }

        let entry = self.user_entry(user_id);
        let mut log = entry.lock().await;
        self.ensure_loaded(&mut log).await?;
        self.flush_locked(&mut log, &config).await?;
        self.reader_locked(&log, after).await
    }

    async fn reader_locked(
        &self,
        log: &UserLog,
        after: SequenceNo,
    ) -> Result<SinceReader, PersistenceError> {
        let head = log.head;
        if head <= after {
            return Ok(SinceReader::empty(after));
        }
        let segments = list_segments(&self.user_dir(&log.key)).await?;
        Ok(SinceReader::new(segments, log.pending.clone(), after, head))
    }

    /// Most recent record of a user, falling back to the on-disk copy
    pub async fn latest(&self, user_id: &str) -> Option<ThoughtRecord> {
        if let Some(record) = self.latest.get(user_id) {
            return Some(record.clone());
        }
        if !self.config.snapshot().general.enable_persistence {
            return None;
        }

        let path = self.latest_path(&UserKey::from_user_id(user_id));
        match read_json_opt::<ThoughtRecord>(&path).await {
            Ok(Some(record)) => {
                self.latest
                    .entry(user_id.to_string())
                    .or_insert_with(|| record.clone());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read latest record: {}", e);
                None
            }
        }
    }

    /// Durable export cursor, `None` if the user never exported
    pub async fn load_cursor(&self, user_id: &str) -> Result<Option<ExportCursor>, PersistenceError> {
        if !self.config.snapshot().general.enable_persistence {
            return Ok(None);
        }
        read_json_opt(&self.cursor_path(&UserKey::from_user_id(user_id))).await
    }

    /// Persist an export cursor, serialized with the user's appends
    pub async fn save_cursor(&self, cursor: &ExportCursor) -> Result<(), PersistenceError> {
        if !self.config.snapshot().general.enable_persistence {
            return Ok(());
        }
        let entry = self.user_entry(&cursor.user_id);
        let log = entry.lock().await;
        let dir = self.user_dir(&log.key);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistenceError::io("create", &dir, e))?;
        write_json_atomic(&dir.join(CURSOR_FILE), cursor).await
    }

    /// Drop the in-memory state of an idle user.
    ///
    /// Nothing is released while records are still buffered or another task
    /// holds the user's state. Without persistence the in-memory counter is
    /// the only record of the sequence, so it is kept. Returns whether the
    /// state was dropped.
    pub fn release(&self, user_id: &str) -> bool {
        if !self.config.snapshot().general.enable_persistence {
            return false;
        }
        let removed = self
            .users
            .remove_if(user_id, |_, entry| {
                Arc::strong_count(entry) == 1
                    && entry
                        .try_lock()
                        .map(|log| log.pending.is_empty())
                        .unwrap_or(false)
            })
            .is_some();
        if removed {
            self.latest.remove(user_id);
        }
        removed
    }
}
