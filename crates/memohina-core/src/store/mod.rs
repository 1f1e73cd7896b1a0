//! Rotated local record store
//!
//! Each user owns a directory of JSON Lines segment files:
//!
//! ```text
//! <storage_dir>/session/<user_key>/
//!   segment_000000000001.jsonl   records 1..=20
//!   segment_000000000021.jsonl   records 21..   (active)
//!   latest.json                  most recent record, for /think after restart
//!   cursor.json                  durable export cursor
//! ```
//!
//! Segments are named by their first sequence number, so a reader positioned
//! at a cursor can skip every segment that ends before it without opening it.

mod files;
mod reader;
mod record_store;
mod rotation;
mod segment;

#[cfg(test)]
mod tests;

pub(crate) use files::write_json_atomic;
pub use reader::SinceReader;
pub use record_store::RecordStore;
pub use segment::SegmentInfo;
