//! Cursor cache statistics

use serde::{Deserialize, Serialize};

/// Counters of a [`super::CursorCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entry_count: usize,
    pub capacity: usize,
}

impl CursorCacheStats {
    /// Fraction of lookups served from memory
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
