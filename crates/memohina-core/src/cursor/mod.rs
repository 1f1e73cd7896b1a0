//! Bounded cache of export cursors
//!
//! Hot cursors live in an LRU; evicted or never-seen users fall back to the
//! durable cursor, so eviction only costs a file read.

mod cache;
mod types;

pub use cache::{CursorCache, CursorStore};
pub use types::CursorCacheStats;
