//! Scheduler seams and statistics

use crate::error::PersistenceError;
use crate::store::RecordStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a loop flushes
#[async_trait]
pub trait FlushTarget: Send + Sync {
    async fn flush(&self, user_id: &str) -> Result<usize, PersistenceError>;

    /// Drop a retired user's in-memory state
    fn release(&self, _user_id: &str) {}
}

#[async_trait]
impl FlushTarget for RecordStore {
    async fn flush(&self, user_id: &str) -> Result<usize, PersistenceError> {
        RecordStore::flush(self, user_id).await
    }

    fn release(&self, user_id: &str) {
        RecordStore::release(self, user_id);
    }
}

/// Lifetime counters of an [`super::ActivityScheduler`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub active_loops: usize,
    pub loops_started: u64,
    pub loops_retired: u64,
    pub periodic_flushes: u64,
    pub final_flushes: u64,
    pub flush_failures: u64,
}
