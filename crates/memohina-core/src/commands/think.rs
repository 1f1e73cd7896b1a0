//! `/think` helpers

use crate::error::PersistenceError;
use crate::store::write_json_atomic;
use crate::types::ThoughtRecord;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Cut `text` to at most `max` characters, never inside a code point
pub(crate) fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((end, _)) => (text[..end].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Write the full record as pretty JSON under `dir`
pub(crate) async fn export_full_record(
    dir: &Path,
    record: &ThoughtRecord,
    now: DateTime<Utc>,
) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| PersistenceError::io("create", dir, e))?;

    let name = format!(
        "thought_{}_{}.json",
        now.format("%Y%m%d_%H%M%S"),
        record.sequence_no
    );
    let path = dir.join(name);
    write_json_atomic(&path, record).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_counts_characters() {
        assert_eq!(truncate_chars("思考中的雛", 2), ("思考".to_string(), true));
        assert_eq!(truncate_chars("short", 5), ("short".to_string(), false));
        assert_eq!(truncate_chars("", 3), (String::new(), false));
    }
}
