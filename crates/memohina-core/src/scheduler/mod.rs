//! Per-user activity scheduler
//!
//! A user is IDLE until a record arrives. [`ActivityScheduler::touch`] then
//! starts one background loop that flushes the user's buffered records every
//! `save_interval_seconds`. After `user_inactivity_timeout_seconds` without a
//! record the loop flushes one last time, releases the user's in-memory state
//! and exits. The next record starts a fresh loop.

mod runner;
mod types;

#[cfg(test)]
mod tests;

pub use types::{FlushTarget, SchedulerStats};

use crate::config::ConfigHandle;
use crate::types::UserKey;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info, warn};

/// Registry entry of a running loop
pub(crate) struct LoopEntry {
    pub generation: u64,
    pub last_activity: Instant,
    pub handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub loops_started: AtomicU64,
    pub loops_retired: AtomicU64,
    pub periodic_flushes: AtomicU64,
    pub final_flushes: AtomicU64,
    pub flush_failures: AtomicU64,
}

pub(crate) struct Shared {
    pub target: Arc<dyn FlushTarget>,
    pub config: ConfigHandle,
    /// Held for check-and-remove on retirement, so `touch` never races a loop
    /// that is about to exit
    pub loops: Mutex<HashMap<String, LoopEntry>>,
    pub shutdown: CancellationToken,
    pub counters: Counters,
    next_generation: AtomicU64,
}

/// Starts, keeps alive and retires per-user flush loops
#[derive(Clone)]
pub struct ActivityScheduler {
    shared: Arc<Shared>,
}

impl ActivityScheduler {
    pub fn new(target: Arc<dyn FlushTarget>, config: ConfigHandle) -> Self {
        Self {
            shared: Arc::new(Shared {
                target,
                config,
                loops: Mutex::new(HashMap::new()),
                shutdown: CancellationToken::new(),
                counters: Counters::default(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Record activity for a user, starting its loop if none is running.
    ///
    /// Must be called from within a Tokio runtime. Ignored after shutdown.
    pub fn touch(&self, user_id: &str) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }

        let now = Instant::now();
        let mut loops = self.shared.loops.lock();
        if let Some(entry) = loops.get_mut(user_id) {
            entry.last_activity = now;
            return;
        }

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let span = debug_span!(
            "activity_loop",
            user_key = %UserKey::from_user_id(user_id),
            generation
        );
        let handle = tokio::spawn(
            runner::run_loop(self.shared.clone(), user_id.to_string(), generation).instrument(span),
        );
        loops.insert(
            user_id.to_string(),
            LoopEntry {
                generation,
                last_activity: now,
                handle: Some(handle),
            },
        );
        self.shared.counters.loops_started.fetch_add(1, Ordering::Relaxed);
        debug!(generation, "started activity loop");
    }

    /// Whether a loop is running for the user
    pub fn is_active(&self, user_id: &str) -> bool {
        self.shared.loops.lock().contains_key(user_id)
    }

    pub fn active_users(&self) -> usize {
        self.shared.loops.lock().len()
    }

    pub fn stats(&self) -> SchedulerStats {
        let c = &self.shared.counters;
        SchedulerStats {
            active_loops: self.active_users(),
            loops_started: c.loops_started.load(Ordering::Relaxed),
            loops_retired: c.loops_retired.load(Ordering::Relaxed),
            periodic_flushes: c.periodic_flushes.load(Ordering::Relaxed),
            final_flushes: c.final_flushes.load(Ordering::Relaxed),
            flush_failures: c.flush_failures.load(Ordering::Relaxed),
        }
    }

    /// Stop every loop after a final flush and wait for them to finish
    pub async fn shutdown(&self) {
        self.shared.shutdown.cancel();
        let handles: Vec<JoinHandle<()>> = self
            .shared
            .loops
            .lock()
            .values_mut()
            .filter_map(|entry| entry.handle.take())
            .collect();

        let count = handles.len();
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("activity loop ended abnormally: {}", e);
            }
        }
        info!(loops = count, "activity scheduler stopped");
    }
}
