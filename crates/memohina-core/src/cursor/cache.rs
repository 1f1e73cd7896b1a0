//! LRU cursor cache over a durable cursor store

use super::types::CursorCacheStats;
use crate::config::ConfigHandle;
use crate::error::PersistenceError;
use crate::store::RecordStore;
use crate::types::ExportCursor;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Durable home of export cursors
#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load_cursor(&self, user_id: &str) -> Result<Option<ExportCursor>, PersistenceError>;

    async fn save_cursor(&self, cursor: &ExportCursor) -> Result<(), PersistenceError>;
}

#[async_trait]
impl CursorStore for RecordStore {
    async fn load_cursor(&self, user_id: &str) -> Result<Option<ExportCursor>, PersistenceError> {
        RecordStore::load_cursor(self, user_id).await
    }

    async fn save_cursor(&self, cursor: &ExportCursor) -> Result<(), PersistenceError> {
        RecordStore::save_cursor(self, cursor).await
    }
}

fn capacity_of(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}

/// Per-user export cursors, at most `upload_cache_size` in memory.
///
/// The lock is never held across an `.await`: durable reads and writes happen
/// outside it. Concurrent `get`/`set` for the same user are serialized by the
/// exporter's per-user lock, not here.
pub struct CursorCache {
    cache: Mutex<LruCache<String, ExportCursor>>,
    stats: Mutex<CursorCacheStats>,
    durable: Arc<dyn CursorStore>,
    config: ConfigHandle,
}

impl CursorCache {
    pub fn new(durable: Arc<dyn CursorStore>, config: ConfigHandle) -> Self {
        let capacity = config.snapshot().general.upload_cache_size;
        Self {
            cache: Mutex::new(LruCache::new(capacity_of(capacity))),
            stats: Mutex::new(CursorCacheStats {
                capacity,
                ..Default::default()
            }),
            durable,
            config,
        }
    }

    /// Follow `upload_cache_size` changes; shrinking evicts the oldest entries
    fn sync_capacity(&self, cache: &mut LruCache<String, ExportCursor>) {
        let wanted = capacity_of(self.config.snapshot().general.upload_cache_size);
        if cache.cap() == wanted {
            return;
        }
        let before = cache.len();
        cache.resize(wanted);
        let mut stats = self.stats.lock();
        stats.evictions += (before - cache.len()) as u64;
        stats.capacity = wanted.get();
        stats.entry_count = cache.len();
        debug!(capacity = wanted.get(), "resized cursor cache");
    }

    /// Cursor of a user; a miss reads the durable cursor, defaulting to 0
    pub async fn get(&self, user_id: &str) -> Result<ExportCursor, PersistenceError> {
        {
            let mut cache = self.cache.lock();
            self.sync_capacity(&mut cache);
            if let Some(cursor) = cache.get(user_id) {
                self.stats.lock().hits += 1;
                return Ok(cursor.clone());
            }
        }

        self.stats.lock().misses += 1;
        let cursor = self
            .durable
            .load_cursor(user_id)
            .await?
            .unwrap_or_else(|| ExportCursor::initial(user_id));

        let mut cache = self.cache.lock();
        if !cache.contains(user_id) {
            self.put_locked(&mut cache, cursor.clone());
        }
        Ok(cursor)
    }

    /// Persist a cursor, then publish it in memory.
    ///
    /// This is the commit point of an export: when the durable write fails the
    /// cached cursor is left untouched.
    pub async fn set(&self, cursor: ExportCursor) -> Result<(), PersistenceError> {
        self.durable.save_cursor(&cursor).await?;
        let mut cache = self.cache.lock();
        self.sync_capacity(&mut cache);
        self.put_locked(&mut cache, cursor);
        Ok(())
    }

    fn put_locked(&self, cache: &mut LruCache<String, ExportCursor>, cursor: ExportCursor) {
        let key = cursor.user_id.clone();
        let evicted = cache.push(key.clone(), cursor);
        let mut stats = self.stats.lock();
        if let Some((old_key, _)) = evicted {
            if old_key != key {
                stats.evictions += 1;
                debug!("evicted cursor from cache");
            }
        }
        stats.entry_count = cache.len();
    }

    /// Whether a user's cursor is currently held in memory
    pub fn contains(&self, user_id: &str) -> bool {
        self.cache.lock().contains(user_id)
    }

    pub fn stats(&self) -> CursorCacheStats {
        *self.stats.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryCursors {
        cursors: Mutex<HashMap<String, ExportCursor>>,
        loads: AtomicUsize,
        fail_saves: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl CursorStore for MemoryCursors {
        async fn load_cursor(&self, user_id: &str) -> Result<Option<ExportCursor>, PersistenceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.cursors.lock().get(user_id).cloned())
        }

        async fn save_cursor(&self, cursor: &ExportCursor) -> Result<(), PersistenceError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(PersistenceError::corrupt(
                    std::path::Path::new("cursor.json"),
                    "disk full",
                ));
            }
            self.cursors
                .lock()
                .insert(cursor.user_id.clone(), cursor.clone());
            Ok(())
        }
    }

    fn cache_with(capacity: usize) -> (CursorCache, Arc<MemoryCursors>, ConfigHandle) {
        let mut config = ArchiveConfig::default();
        config.general.upload_cache_size = capacity;
        let handle = ConfigHandle::new(config);
        let durable = Arc::new(MemoryCursors::default());
        (CursorCache::new(durable.clone(), handle.clone()), durable, handle)
    }

    fn committed(user: &str, seq: u64) -> ExportCursor {
        ExportCursor::committed(user, seq, Utc::now(), format!("https://cdn/{}/{}", user, seq))
    }

    #[tokio::test]
    async fn test_unknown_user_starts_at_zero() {
        let (cache, _durable, _handle) = cache_with(4);
        let cursor = cache.get("new").await.unwrap();
        assert_eq!(cursor, ExportCursor::initial("new"));
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_set_is_durable_and_cached() {
        let (cache, durable, _handle) = cache_with(4);
        cache.set(committed("a", 3)).await.unwrap();

        assert_eq!(durable.cursors.lock()["a"].last_exported_sequence_no, 3);
        assert_eq!(cache.get("a").await.unwrap().last_exported_sequence_no, 3);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(durable.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_evicted_user_reloads_durable_cursor() {
        let (cache, durable, _handle) = cache_with(2);
        cache.set(committed("a", 3)).await.unwrap();
        cache.set(committed("b", 5)).await.unwrap();
        cache.set(committed("c", 7)).await.unwrap();

        assert!(!cache.contains("a"));
        assert_eq!(cache.stats().evictions, 1);

        let cursor = cache.get("a").await.unwrap();
        assert_eq!(cursor.last_exported_sequence_no, 3);
        assert_eq!(durable.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_cursor() {
        let (cache, durable, _handle) = cache_with(2);
        cache.set(committed("a", 3)).await.unwrap();
        durable.fail_saves.store(true, Ordering::SeqCst);

        assert!(cache.set(committed("a", 9)).await.is_err());
        assert_eq!(cache.get("a").await.unwrap().last_exported_sequence_no, 3);
    }

    #[tokio::test]
    async fn test_capacity_follows_config() {
        let (cache, _durable, handle) = cache_with(3);
        for (user, seq) in [("a", 1), ("b", 2), ("c", 3)] {
            cache.set(committed(user, seq)).await.unwrap();
        }

        handle.update(|c| c.general.upload_cache_size = 1).unwrap();
        cache.get("c").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.entry_count, 1);
        assert!(cache.contains("c"));
        assert!(!cache.contains("a"));
    }
}
