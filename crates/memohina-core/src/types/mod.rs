//! Shared data types

mod cursor;
mod record;
mod user_key;

pub use cursor::ExportCursor;
pub use record::{NewThought, ThoughtRecord};
pub use user_key::UserKey;

/// Per-user sequence number; 0 means "before the first record"
pub type SequenceNo = u64;
