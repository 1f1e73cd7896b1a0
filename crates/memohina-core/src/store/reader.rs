//! Lazy reads of a user's records after a cursor

use super::segment::{SegmentInfo, read_segment};
use crate::error::PersistenceError;
use crate::types::{SequenceNo, ThoughtRecord};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::debug;

/// Records with `after < sequence_no <= head`, oldest first.
///
/// Segments are opened one at a time as the reader advances, so a bounded
/// `take` never loads the whole log. `head` and the unflushed tail are
/// captured when the reader is opened; appends made afterwards are not seen.
/// Sequence numbers are strictly increasing; a record repeated on disk after
/// an interrupted flush is yielded once.
pub struct SinceReader {
    segments: VecDeque<PathBuf>,
    buffer: VecDeque<ThoughtRecord>,
    tail: Vec<ThoughtRecord>,
    last: SequenceNo,
    head: SequenceNo,
}

impl SinceReader {
    pub(crate) fn new(
        segments: Vec<SegmentInfo>,
        tail: Vec<ThoughtRecord>,
        after: SequenceNo,
        head: SequenceNo,
    ) -> Self {
        // Start at the segment holding `after + 1`; everything before ends at or below the cursor.
        let start = segments
            .iter()
            .rposition(|s| s.first_seq <= after.saturating_add(1))
            .unwrap_or(0);
        Self {
            segments: segments.into_iter().skip(start).map(|s| s.path).collect(),
            buffer: VecDeque::new(),
            tail,
            last: after,
            head,
        }
    }

    /// A reader that yields nothing
    pub(crate) fn empty(after: SequenceNo) -> Self {
        Self::new(Vec::new(), Vec::new(), after, after)
    }

    /// Highest sequence number this reader can yield
    pub fn head(&self) -> SequenceNo {
        self.head
    }

    /// Next record, or `None` once `head` is reached
    pub async fn next_record(&mut self) -> Result<Option<ThoughtRecord>, PersistenceError> {
        loop {
            if self.last >= self.head {
                return Ok(None);
            }
            if let Some(record) = self.buffer.pop_front() {
                if record.sequence_no <= self.last {
                    debug!(seq = record.sequence_no, "skipping already yielded record");
                    continue;
                }
                if record.sequence_no > self.head {
                    self.buffer.clear();
                    continue;
                }
                self.last = record.sequence_no;
                return Ok(Some(record));
            }
            if let Some(path) = self.segments.pop_front() {
                self.buffer = read_segment(&path).await?.records.into();
                continue;
            }
            if !self.tail.is_empty() {
                self.buffer = std::mem::take(&mut self.tail).into();
                continue;
            }
            return Ok(None);
        }
    }

    /// Collect up to `limit` records
    pub async fn take(mut self, limit: usize) -> Result<Vec<ThoughtRecord>, PersistenceError> {
        let mut records = Vec::with_capacity(limit.min(1024));
        while records.len() < limit {
            match self.next_record().await? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(records)
    }
}
