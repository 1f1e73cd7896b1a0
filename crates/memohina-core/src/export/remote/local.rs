//! Directory-backed archive

use super::{RemoteArchive, content_type_for};
use crate::error::RemoteStoreError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes snapshots below a directory, refusing to replace existing files.
///
/// Locators use `public_base_url` when set (for a directory served over
/// HTTP), otherwise a `file://` URL.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target(&self, key: &str) -> Result<PathBuf, RemoteStoreError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(RemoteStoreError::Rejected {
                status: 400,
                message: format!("invalid object key: {}", key),
            });
        }
        Ok(self.root.join(relative))
    }

    fn locator(&self, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => {
                let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
                format!("file://{}", absolute.display())
            }
        }
    }
}

fn map_io(key: &str, e: std::io::Error) -> RemoteStoreError {
    match e.kind() {
        ErrorKind::AlreadyExists => RemoteStoreError::Conflict(key.to_string()),
        ErrorKind::PermissionDenied => RemoteStoreError::Auth(e.to_string()),
        ErrorKind::StorageFull => RemoteStoreError::Quota(e.to_string()),
        _ => RemoteStoreError::Network(format!("local archive write failed: {}", e)),
    }
}

#[async_trait]
impl RemoteArchive for LocalArchive {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, RemoteStoreError> {
        let path = self.target(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| map_io(key, e))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| map_io(key, e))?;
        file.write_all(&bytes).await.map_err(|e| map_io(key, e))?;
        file.sync_all().await.map_err(|e| map_io(key, e))?;

        debug!(key, bytes = bytes.len(), content_type = content_type_for(key), "archived locally");
        Ok(self.locator(key, &path))
    }

    fn name(&self) -> &str {
        "local"
    }
}
