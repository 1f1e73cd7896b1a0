//! Snapshot documents and their remote keys

use crate::error::ExportError;
use crate::types::{SequenceNo, ThoughtRecord, UserKey};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One exported batch of a user's records.
///
/// Covers `from_seq < sequence_no <= to_seq`; `from_seq` is the cursor the
/// batch was read after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub user_id: String,
    pub user_key: String,
    pub generated_at: DateTime<Utc>,
    pub from_seq: SequenceNo,
    pub to_seq: SequenceNo,
    pub record_count: usize,
    pub records: Vec<ThoughtRecord>,
}

impl Snapshot {
    /// Build a snapshot from records read after `from_seq`; `None` when empty
    pub fn new(
        user_id: &str,
        from_seq: SequenceNo,
        records: Vec<ThoughtRecord>,
        generated_at: DateTime<Utc>,
    ) -> Option<Self> {
        let to_seq = records.last()?.sequence_no;
        Some(Self {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            user_key: UserKey::from_user_id(user_id).to_string(),
            generated_at,
            from_seq,
            to_seq,
            record_count: records.len(),
            records,
        })
    }
}

/// `<prefix>/<user_key>/<user_key>_<YYYYmmdd_HHMMSS_mmm>_<from>-<to>.json[.gz]`
///
/// The timestamp and range make every key unique per user, so a snapshot is
/// never overwritten.
pub fn snapshot_key(prefix: &str, snapshot: &Snapshot, compressed: bool) -> String {
    let prefix = prefix.trim_matches('/');
    let stamp = snapshot.generated_at.format("%Y%m%d_%H%M%S_%3f");
    let ext = if compressed { "json.gz" } else { "json" };
    let name = format!(
        "{key}_{stamp}_{from}-{to}.{ext}",
        key = snapshot.user_key,
        from = snapshot.from_seq,
        to = snapshot.to_seq,
    );
    if prefix.is_empty() {
        format!("{}/{}", snapshot.user_key, name)
    } else {
        format!("{}/{}/{}", prefix, snapshot.user_key, name)
    }
}

/// Serialize a snapshot as pretty JSON, optionally gzipped
pub fn encode_snapshot(snapshot: &Snapshot, compress: bool) -> Result<Vec<u8>, ExportError> {
    let json =
        serde_json::to_vec_pretty(snapshot).map_err(|e| ExportError::Encode(e.to_string()))?;
    if !compress {
        return Ok(json);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| ExportError::Encode(e.to_string()))
}
