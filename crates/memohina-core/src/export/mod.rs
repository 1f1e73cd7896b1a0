//! Incremental snapshot export
//!
//! An export reads the records after a user's cursor, packs them into an
//! immutable [`Snapshot`] under a fresh key, uploads it, and only then moves
//! the cursor. Consecutive successful exports cover disjoint, contiguous
//! sequence ranges; a failed upload leaves the cursor where it was.

mod exporter;
pub mod remote;
mod snapshot;


pub use exporter::{ExportOutcome, IncrementalExporter};
pub use remote::{HttpArchive, LocalArchive, RemoteArchive, archive_from_config};
pub use snapshot::{Snapshot, encode_snapshot, snapshot_key};
