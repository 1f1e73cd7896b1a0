use super::*;
use crate::config::ArchiveConfig;
use crate::error::PersistenceError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct CountingTarget {
    flushes: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
    fail: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl FlushTarget for CountingTarget {
    async fn flush(&self, user_id: &str) -> Result<usize, PersistenceError> {
        self.flushes.lock().push(user_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::corrupt(std::path::Path::new("x"), "boom"));
        }
        Ok(1)
    }

    fn release(&self, user_id: &str) {
        self.released.lock().push(user_id.to_string());
    }
}

fn scheduler(save: u64, timeout: u64) -> (ActivityScheduler, Arc<CountingTarget>) {
    let mut config = ArchiveConfig::default();
    config.scheduler.save_interval_seconds = save;
    config.scheduler.user_inactivity_timeout_seconds = timeout;
    let target = Arc::new(CountingTarget::default());
    (
        ActivityScheduler::new(target.clone(), ConfigHandle::new(config)),
        target,
    )
}

#[tokio::test(start_paused = true)]
async fn test_idle_user_gets_one_final_flush() {
    let (scheduler, target) = scheduler(60, 300);
    scheduler.touch("u");
    assert!(scheduler.is_active("u"));

    sleep(Duration::from_secs(301)).await;

    let stats = scheduler.stats();
    assert_eq!(stats.final_flushes, 1);
    assert_eq!(stats.periodic_flushes, 4);
    assert_eq!(stats.loops_retired, 1);
    assert!(!scheduler.is_active("u"));
    assert_eq!(*target.released.lock(), vec!["u".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_activity_after_retirement_starts_new_loop() {
    let (scheduler, _target) = scheduler(60, 300);
    scheduler.touch("u");
    sleep(Duration::from_secs(301)).await;
    assert!(!scheduler.is_active("u"));

    sleep(Duration::from_secs(99)).await;
    scheduler.touch("u");

    assert!(scheduler.is_active("u"));
    assert_eq!(scheduler.stats().loops_started, 2);
}

#[tokio::test(start_paused = true)]
async fn test_activity_extends_deadline() {
    let (scheduler, _target) = scheduler(60, 300);
    scheduler.touch("u");
    sleep(Duration::from_secs(200)).await;
    scheduler.touch("u");
    sleep(Duration::from_secs(200)).await;

    assert!(scheduler.is_active("u"));
    assert_eq!(scheduler.stats().final_flushes, 0);
    assert_eq!(scheduler.stats().loops_started, 1);

    sleep(Duration::from_secs(101)).await;
    assert!(!scheduler.is_active("u"));
    assert_eq!(scheduler.stats().final_flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_touch_keeps_single_loop() {
    let (scheduler, _target) = scheduler(60, 300);
    for _ in 0..10 {
        scheduler.touch("u");
    }
    scheduler.touch("v");

    assert_eq!(scheduler.active_users(), 2);
    assert_eq!(scheduler.stats().loops_started, 2);
}

#[tokio::test(start_paused = true)]
async fn test_flush_failures_do_not_stop_loop() {
    let (scheduler, target) = scheduler(10, 300);
    target.fail.store(true, Ordering::SeqCst);
    scheduler.touch("u");

    sleep(Duration::from_secs(35)).await;

    assert!(scheduler.is_active("u"));
    assert_eq!(scheduler.stats().flush_failures, 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_final_flush_keeps_loop_until_flush_succeeds() {
    let (scheduler, target) = scheduler(60, 300);
    target.fail.store(true, Ordering::SeqCst);
    scheduler.touch("u");

    sleep(Duration::from_secs(301)).await;
    assert!(scheduler.is_active("u"));
    assert_eq!(scheduler.stats().final_flushes, 1);
    assert_eq!(scheduler.stats().loops_retired, 0);
    assert!(target.released.lock().is_empty());

    target.fail.store(false, Ordering::SeqCst);
    sleep(Duration::from_secs(300)).await;

    let stats = scheduler.stats();
    assert!(!scheduler.is_active("u"));
    assert_eq!(stats.final_flushes, 2);
    assert_eq!(stats.loops_retired, 1);
    assert_eq!(*target.released.lock(), vec!["u".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_every_user() {
    let (scheduler, target) = scheduler(60, 300);
    scheduler.touch("a");
    scheduler.touch("b");
    sleep(Duration::from_secs(1)).await;

    scheduler.shutdown().await;

    assert_eq!(scheduler.stats().final_flushes, 2);
    assert_eq!(scheduler.active_users(), 0);
    let mut flushed = target.flushes.lock().clone();
    flushed.sort();
    assert_eq!(flushed, vec!["a".to_string(), "b".to_string()]);

    scheduler.touch("c");
    assert!(!scheduler.is_active("c"));
}
