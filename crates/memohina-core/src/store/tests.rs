use super::*;
use crate::config::{ArchiveConfig, ConfigHandle};
use crate::types::{ExportCursor, NewThought, UserKey};
use tempfile::TempDir;

fn create_test_store(change: impl FnOnce(&mut ArchiveConfig)) -> (RecordStore, ConfigHandle, TempDir) {
    let temp = TempDir::new().unwrap();
    let mut config = ArchiveConfig::default();
    config.general.storage_dir = temp.path().to_path_buf();
    change(&mut config);
    let handle = ConfigHandle::new(config);
    (RecordStore::new(handle.clone()), handle, temp)
}

fn thought(user: &str, n: u32) -> NewThought {
    NewThought::new(user, "session-1", format!("reasoning {}", n), format!("answer {}", n))
}

async fn append_n(store: &RecordStore, user: &str, count: u32) {
    for n in 1..=count {
        store.append(thought(user, n)).await.unwrap();
    }
}

fn seqs(records: &[crate::types::ThoughtRecord]) -> Vec<u64> {
    records.iter().map(|r| r.sequence_no).collect()
}

#[tokio::test]
async fn test_sequence_numbers_are_per_user() {
    let (store, _handle, _temp) = create_test_store(|_| {});

    let a1 = store.append(thought("alice", 1)).await.unwrap();
    let b1 = store.append(thought("bob", 1)).await.unwrap();
    let a2 = store.append(thought("alice", 2)).await.unwrap();

    assert_eq!(a1.sequence_no, 1);
    assert_eq!(b1.sequence_no, 1);
    assert_eq!(a2.sequence_no, 2);
    assert_eq!(store.head("alice").await.unwrap(), 2);
    assert_eq!(store.head("carol").await.unwrap(), 0);
}

#[tokio::test]
async fn test_restart_recovers_head() {
    let (store, handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 3).await;
    assert_eq!(store.flush("u").await.unwrap(), 3);
    drop(store);

    let reopened = RecordStore::new(handle);
    let next = reopened.append(thought("u", 4)).await.unwrap();
    assert_eq!(next.sequence_no, 4);
}

#[tokio::test]
async fn test_unflushed_records_are_lost_on_restart() {
    let (store, handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();
    store.append(thought("u", 3)).await.unwrap();
    drop(store);

    let reopened = RecordStore::new(handle);
    assert_eq!(reopened.head("u").await.unwrap(), 2);
}

#[tokio::test]
async fn test_write_through_persists_each_append() {
    let (store, handle, _temp) = create_test_store(|_| {});
    let store = store.with_write_through(true);
    append_n(&store, "u", 2).await;
    drop(store);

    let reopened = RecordStore::new(handle);
    assert_eq!(reopened.head("u").await.unwrap(), 2);
}

#[tokio::test]
async fn test_rotation_splits_segments() {
    let (store, _handle, _temp) = create_test_store(|c| c.general.log_rotation_count = 2);
    append_n(&store, "u", 5).await;
    store.flush("u").await.unwrap();

    let dir = store.user_dir(&UserKey::from_user_id("u"));
    let segments = segment::list_segments(&dir).await.unwrap();
    let firsts: Vec<u64> = segments.iter().map(|s| s.first_seq).collect();
    assert_eq!(firsts, vec![1, 3, 5]);
}

#[tokio::test]
async fn test_rotation_continues_across_flushes() {
    let (store, _handle, _temp) = create_test_store(|c| c.general.log_rotation_count = 3);
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();

    let dir = store.user_dir(&UserKey::from_user_id("u"));
    let firsts: Vec<u64> = segment::list_segments(&dir)
        .await
        .unwrap()
        .iter()
        .map(|s| s.first_seq)
        .collect();
    assert_eq!(firsts, vec![1, 4]);
}

#[tokio::test]
async fn test_read_since_spans_segments_and_pending() {
    let (store, _handle, _temp) = create_test_store(|c| c.general.log_rotation_count = 2);
    append_n(&store, "u", 5).await;
    store.flush("u").await.unwrap();
    append_n(&store, "u", 2).await;

    let all = store.read_since("u", 0).await.unwrap().take(100).await.unwrap();
    assert_eq!(seqs(&all), vec![1, 2, 3, 4, 5, 6, 7]);

    let tail = store.read_since("u", 3).await.unwrap().take(3).await.unwrap();
    assert_eq!(seqs(&tail), vec![4, 5, 6]);

    let none = store.read_since("u", 7).await.unwrap().take(10).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_reader_ignores_later_appends() {
    let (store, _handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;
    let reader = store.read_since("u", 0).await.unwrap();
    store.append(thought("u", 3)).await.unwrap();
    store.flush("u").await.unwrap();

    assert_eq!(reader.head(), 2);
    assert_eq!(seqs(&reader.take(10).await.unwrap()), vec![1, 2]);
}

#[tokio::test]
async fn test_retention_removes_oldest_segments() {
    let (store, _handle, _temp) = create_test_store(|c| {
        c.general.log_rotation_count = 1;
        c.general.retention_segments = 2;
    });
    append_n(&store, "u", 5).await;
    store.flush("u").await.unwrap();

    let dir = store.user_dir(&UserKey::from_user_id("u"));
    let firsts: Vec<u64> = segment::list_segments(&dir)
        .await
        .unwrap()
        .iter()
        .map(|s| s.first_seq)
        .collect();
    assert_eq!(firsts, vec![4, 5]);

    let remaining = store.read_since("u", 0).await.unwrap().take(10).await.unwrap();
    assert_eq!(seqs(&remaining), vec![4, 5]);
}

#[tokio::test]
async fn test_retention_protects_unexported_segments() {
    let (store, _handle, _temp) = create_test_store(|c| {
        c.general.log_rotation_count = 1;
        c.general.retention_segments = 1;
        c.general.protect_unexported = true;
    });
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();
    store
        .save_cursor(&ExportCursor::committed("u", 1, chrono::Utc::now(), "file:///x"))
        .await
        .unwrap();
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();

    let dir = store.user_dir(&UserKey::from_user_id("u"));
    let firsts: Vec<u64> = segment::list_segments(&dir)
        .await
        .unwrap()
        .iter()
        .map(|s| s.first_seq)
        .collect();
    // Segment 1 was exported; 2 and 3 were not.
    assert_eq!(firsts, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_torn_trailing_line_is_skipped() {
    let (store, handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();
    drop(store);

    let probe = RecordStore::new(handle.clone());
    let dir = probe.user_dir(&UserKey::from_user_id("u"));
    let path = dir.join(SegmentInfo::file_name(1));
    let mut content = tokio::fs::read_to_string(&path).await.unwrap();
    content.push_str(r#"{"user_id":"u","session_id":"ses"#);
    tokio::fs::write(&path, content).await.unwrap();
    drop(probe);

    let reopened = RecordStore::new(handle);
    let next = reopened.append(thought("u", 3)).await.unwrap();
    assert_eq!(next.sequence_no, 3);
    reopened.flush("u").await.unwrap();

    let all = reopened.read_since("u", 0).await.unwrap().take(10).await.unwrap();
    assert_eq!(seqs(&all), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unreadable_log_still_updates_latest() {
    let (store, _handle, temp) = create_test_store(|_| {});
    tokio::fs::write(temp.path().join("session"), b"blocker").await.unwrap();

    assert!(store.append(thought("u", 1)).await.is_err());
    assert_eq!(store.latest("u").await.unwrap().reasoning_text, "reasoning 1");

    tokio::fs::remove_file(temp.path().join("session")).await.unwrap();
    let next = store.append(thought("u", 2)).await.unwrap();
    assert_eq!(next.sequence_no, 1);
}

#[tokio::test]
async fn test_failed_flush_keeps_records_buffered() {
    let (store, _handle, temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;

    // A file where the session directory belongs makes the flush fail.
    let blocker = temp.path().join("session");
    tokio::fs::write(&blocker, b"blocker").await.unwrap();
    assert!(store.flush("u").await.is_err());

    tokio::fs::remove_file(&blocker).await.unwrap();
    assert_eq!(store.flush("u").await.unwrap(), 2);

    let all = store.read_since("u", 0).await.unwrap().take(10).await.unwrap();
    assert_eq!(seqs(&all), vec![1, 2]);
}

#[tokio::test]
async fn test_disabled_persistence_counts_in_memory() {
    let (store, _handle, temp) = create_test_store(|c| c.general.enable_persistence = false);
    append_n(&store, "u", 2).await;
    let third = store.append(thought("u", 3)).await.unwrap();

    assert_eq!(third.sequence_no, 3);
    assert_eq!(store.flush("u").await.unwrap(), 0);
    assert!(store.read_since("u", 0).await.unwrap().take(10).await.unwrap().is_empty());
    assert_eq!(store.latest("u").await.unwrap().sequence_no, 3);
    assert!(!store.release("u"));
    assert!(!temp.path().join("session").exists());
}

#[tokio::test]
async fn test_latest_survives_restart() {
    let (store, handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;
    store.flush("u").await.unwrap();
    drop(store);

    let reopened = RecordStore::new(handle);
    let latest = reopened.latest("u").await.unwrap();
    assert_eq!(latest.sequence_no, 2);
    assert_eq!(latest.response_text, "answer 2");
}

#[tokio::test]
async fn test_cursor_roundtrip() {
    let (store, _handle, _temp) = create_test_store(|_| {});
    assert!(store.load_cursor("u").await.unwrap().is_none());

    let cursor = ExportCursor::committed("u", 7, chrono::Utc::now(), "https://x/y.json");
    store.save_cursor(&cursor).await.unwrap();
    assert_eq!(store.load_cursor("u").await.unwrap(), Some(cursor));
}

#[tokio::test]
async fn test_durable_reader_flushes_buffered_records() {
    let (store, handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 2).await;

    let records = store.read_durable_since("u", 0).await.unwrap().take(10).await.unwrap();
    assert_eq!(seqs(&records), vec![1, 2]);

    let reopened = RecordStore::new(handle);
    assert_eq!(reopened.head("u").await.unwrap(), 2);
}

#[tokio::test]
async fn test_head_never_falls_below_export_cursor() {
    let (store, handle, _temp) = create_test_store(|_| {});
    let cursor = ExportCursor::committed("u", 7, chrono::Utc::now(), "https://x/y.json");
    store.save_cursor(&cursor).await.unwrap();

    let reopened = RecordStore::new(handle);
    let next = reopened.append(thought("u", 1)).await.unwrap();
    assert_eq!(next.sequence_no, 8);
}

#[tokio::test]
async fn test_release_waits_for_pending_records() {
    let (store, _handle, _temp) = create_test_store(|_| {});
    append_n(&store, "u", 1).await;

    assert!(!store.release("u"));
    store.flush("u").await.unwrap();
    assert!(store.release("u"));
    assert_eq!(store.tracked_users(), 0);

    // State is recovered from disk on the next touch.
    let next = store.append(thought("u", 2)).await.unwrap();
    assert_eq!(next.sequence_no, 2);
}
