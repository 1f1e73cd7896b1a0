//! Segment files: naming, scanning and appending

use crate::error::PersistenceError;
use crate::types::{SequenceNo, ThoughtRecord};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

const SEGMENT_PREFIX: &str = "segment_";
const SEGMENT_SUFFIX: &str = ".jsonl";

/// A segment file and the first sequence number it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub path: PathBuf,
    pub first_seq: SequenceNo,
}

impl SegmentInfo {
    pub fn file_name(first_seq: SequenceNo) -> String {
        format!("{}{:012}{}", SEGMENT_PREFIX, first_seq, SEGMENT_SUFFIX)
    }

    pub fn new(dir: &Path, first_seq: SequenceNo) -> Self {
        Self {
            path: dir.join(Self::file_name(first_seq)),
            first_seq,
        }
    }

    fn parse(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let digits = name.strip_prefix(SEGMENT_PREFIX)?.strip_suffix(SEGMENT_SUFFIX)?;
        let first_seq = digits.parse().ok()?;
        Some(Self { path, first_seq })
    }
}

/// The segment currently receiving appends
#[derive(Debug, Clone)]
pub(crate) struct ActiveSegment {
    pub info: SegmentInfo,
    pub count: usize,
    /// A crash left a partial last line; the next append starts on a fresh line
    pub torn_tail: bool,
}

/// All segments in `dir`, oldest first
pub(crate) async fn list_segments(dir: &Path) -> Result<Vec<SegmentInfo>, PersistenceError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::io("list", dir, e)),
    };

    let mut segments = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PersistenceError::io("list", dir, e))?
    {
        if let Some(info) = SegmentInfo::parse(entry.path()) {
            segments.push(info);
        }
    }
    segments.sort_by_key(|s| s.first_seq);
    Ok(segments)
}

/// Parsed content of one segment
pub(crate) struct SegmentContent {
    pub records: Vec<ThoughtRecord>,
    pub torn_tail: bool,
}

/// Read a whole segment; unparsable lines are skipped with a warning.
///
/// A missing file reads as empty so readers tolerate concurrent retention.
pub(crate) async fn read_segment(path: &Path) -> Result<SegmentContent, PersistenceError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SegmentContent {
                records: Vec::new(),
                torn_tail: false,
            });
        }
        Err(e) => return Err(PersistenceError::io("read", path, e)),
    };

    let torn_tail = !content.is_empty() && !content.ends_with('\n');
    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ThoughtRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                segment = %path.display(),
                line = line_no + 1,
                "skipping unreadable record: {}",
                e
            ),
        }
    }
    Ok(SegmentContent { records, torn_tail })
}

/// Append records as JSON lines and sync them to disk
pub(crate) async fn append_records(
    segment: &ActiveSegment,
    records: &[ThoughtRecord],
) -> Result<(), PersistenceError> {
    let path = &segment.info.path;
    let mut buf = Vec::with_capacity(records.len() * 256);
    if segment.torn_tail {
        buf.push(b'\n');
    }
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| PersistenceError::io("open", path, e))?;
    file.write_all(&buf)
        .await
        .map_err(|e| PersistenceError::io("append to", path, e))?;
    file.flush()
        .await
        .map_err(|e| PersistenceError::io("flush", path, e))?;
    file.sync_data()
        .await
        .map_err(|e| PersistenceError::io("sync", path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_name_roundtrip() {
        let info = SegmentInfo::new(Path::new("/data/u"), 21);
        assert!(info.path.ends_with("segment_000000000021.jsonl"));
        assert_eq!(SegmentInfo::parse(info.path.clone()), Some(info));
    }

    #[test]
    fn test_foreign_files_are_not_segments() {
        assert!(SegmentInfo::parse(PathBuf::from("/d/latest.json")).is_none());
        assert!(SegmentInfo::parse(PathBuf::from("/d/segment_x.jsonl")).is_none());
        assert!(SegmentInfo::parse(PathBuf::from("/d/segment_000000000001.jsonl.tmp")).is_none());
    }
}
