//! Body of a per-user loop

use super::Shared;
use crate::types::UserKey;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

enum FlushKind {
    Periodic,
    Final,
}

/// Returns whether the buffered records reached disk
async fn flush(shared: &Shared, user_id: &str, kind: FlushKind) -> bool {
    let counter = match kind {
        FlushKind::Periodic => &shared.counters.periodic_flushes,
        FlushKind::Final => &shared.counters.final_flushes,
    };
    counter.fetch_add(1, Ordering::Relaxed);

    match shared.target.flush(user_id).await {
        Ok(0) => true,
        Ok(written) => {
            debug!(written, "flushed buffered records");
            true
        }
        Err(e) => {
            shared.counters.flush_failures.fetch_add(1, Ordering::Relaxed);
            warn!("scheduled flush failed: {}", e);
            false
        }
    }
}

/// Remove the registry entry if it still belongs to this loop
fn remove_entry(shared: &Shared, user_id: &str, generation: u64) {
    let mut loops = shared.loops.lock();
    if loops.get(user_id).is_some_and(|e| e.generation == generation) {
        loops.remove(user_id);
    }
}

/// `None` once the entry no longer belongs to this loop
fn idle_since(shared: &Shared, user_id: &str, generation: u64, timeout: Duration) -> Option<bool> {
    let loops = shared.loops.lock();
    let entry = loops.get(user_id).filter(|e| e.generation == generation)?;
    Some(entry.last_activity + timeout <= Instant::now())
}

pub(super) async fn run_loop(shared: Arc<Shared>, user_id: String, generation: u64) {
    let user_key = UserKey::from_user_id(&user_id);
    let save_interval = shared.config.snapshot().scheduler.save_interval();
    let mut ticker = interval_at(Instant::now() + save_interval, save_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let timeout = shared.config.snapshot().scheduler.inactivity_timeout();
        let last_activity = match shared.loops.lock().get(&user_id) {
            Some(entry) if entry.generation == generation => entry.last_activity,
            _ => return,
        };

        tokio::select! {
            biased;

            _ = shared.shutdown.cancelled() => {
                flush(&shared, &user_id, FlushKind::Final).await;
                remove_entry(&shared, &user_id, generation);
                debug!(user_key = %user_key, "activity loop stopped");
                return;
            }
            _ = sleep_until(last_activity + timeout) => {
                match idle_since(&shared, &user_id, generation, timeout) {
                    None => return,
                    Some(false) => continue,
                    Some(true) => {}
                }
                let flushed = flush(&shared, &user_id, FlushKind::Final).await;

                // A record may have arrived during the flush.
                let mut loops = shared.loops.lock();
                let entry = match loops.get_mut(&user_id) {
                    Some(entry) if entry.generation == generation => entry,
                    _ => return,
                };
                if !flushed {
                    // Buffered records still need this loop; wait another timeout.
                    entry.last_activity = Instant::now();
                    continue;
                }
                if entry.last_activity + timeout <= Instant::now() {
                    loops.remove(&user_id);
                    shared.target.release(&user_id);
                    drop(loops);
                    shared.counters.loops_retired.fetch_add(1, Ordering::Relaxed);
                    info!(user_key = %user_key, "user idle, activity loop retired");
                    return;
                }
            }
            _ = ticker.tick() => {
                flush(&shared, &user_id, FlushKind::Periodic).await;
            }
        }
    }
}
