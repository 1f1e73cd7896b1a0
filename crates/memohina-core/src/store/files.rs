//! Whole-file JSON helpers with atomic replacement

use crate::error::PersistenceError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `value` next to `path` and rename it into place.
///
/// Readers see either the previous content or the new content, never a mix.
pub(crate) async fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);

    if let Err(e) = fs::write(&tmp, &json).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(PersistenceError::io("write", &tmp, e));
    }
    fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistenceError::io("replace", path, e))?;
    Ok(())
}

/// Read a JSON file, `None` when it does not exist
pub(crate) async fn read_json_opt<T: DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io("read", path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| PersistenceError::corrupt(path, format!("unreadable {}: {}", path.display(), e)))
}
