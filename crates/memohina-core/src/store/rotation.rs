//! Segment retention

use super::files::read_json_opt;
use super::segment::list_segments;
use crate::error::PersistenceError;
use crate::types::{ExportCursor, SequenceNo};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Delete the oldest segments beyond `keep`.
///
/// The newest segment is never removed. With `protect_unexported`, deletion
/// stops at the first segment that still holds records after the export
/// cursor, so what remains is always a contiguous range.
pub(crate) async fn enforce_retention(
    dir: &Path,
    cursor_path: &Path,
    keep: usize,
    protect_unexported: bool,
) -> Result<usize, PersistenceError> {
    if keep == 0 {
        return Ok(0);
    }

    let segments = list_segments(dir).await?;
    if segments.len() <= keep {
        return Ok(0);
    }

    let exported: Option<SequenceNo> = if protect_unexported {
        let cursor: Option<ExportCursor> = read_json_opt(cursor_path).await?;
        Some(cursor.map(|c| c.last_exported_sequence_no).unwrap_or(0))
    } else {
        None
    };

    let excess = segments.len() - keep;
    let mut removed = 0;
    for (idx, segment) in segments.iter().take(excess).enumerate() {
        if let Some(exported) = exported {
            // Last record of this segment is one before the next segment's first.
            let last_seq = segments[idx + 1].first_seq.saturating_sub(1);
            if last_seq > exported {
                info!(
                    segment = %segment.path.display(),
                    exported,
                    "retaining segment with unexported records"
                );
                break;
            }
        }

        match fs::remove_file(&segment.path).await {
            Ok(()) => {
                info!(segment = %segment.path.display(), "removed old segment");
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(segment = %segment.path.display(), "failed to remove old segment: {}", e);
                break;
            }
        }
    }
    Ok(removed)
}
