//! Export cursor

use super::SequenceNo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much of a user's log has been archived remotely.
///
/// Records with `sequence_no <= last_exported_sequence_no` belong to a
/// committed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCursor {
    pub user_id: String,
    pub last_exported_sequence_no: SequenceNo,
    pub last_export_timestamp: Option<DateTime<Utc>>,
    /// Locator of the snapshot that produced this cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
}

impl ExportCursor {
    /// Cursor of a user who never exported
    pub fn initial(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            last_exported_sequence_no: 0,
            last_export_timestamp: None,
            last_url: None,
        }
    }

    /// Cursor after committing a snapshot that ends at `to_seq`
    pub fn committed(
        user_id: impl Into<String>,
        to_seq: SequenceNo,
        at: DateTime<Utc>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            last_exported_sequence_no: to_seq,
            last_export_timestamp: Some(at),
            last_url: Some(url.into()),
        }
    }
}
