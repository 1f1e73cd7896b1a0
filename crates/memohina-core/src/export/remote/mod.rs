//! Remote archive backends
//!
//! The exporter only needs `put(key, bytes) -> url`. Keys are never reused,
//! and backends refuse to overwrite an existing object.

mod http;
mod local;

pub use http::HttpArchive;
pub use local::LocalArchive;

use crate::config::{ArchiveConfig, RemoteKind};
use crate::error::{HinaError, HinaResult, RemoteStoreError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Immutable object storage for snapshots
#[async_trait]
pub trait RemoteArchive: Send + Sync {
    /// Store `bytes` under `key` and return a locator for it
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, RemoteStoreError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Build the configured backend
pub fn archive_from_config(config: &ArchiveConfig) -> HinaResult<Arc<dyn RemoteArchive>> {
    let remote = &config.remote;
    match remote.kind {
        RemoteKind::Local => {
            let dir = remote
                .local_dir
                .clone()
                .unwrap_or_else(|| config.general.storage_dir.join("archive"));
            Ok(Arc::new(LocalArchive::new(dir, remote.public_base_url.clone())))
        }
        RemoteKind::Http => {
            let endpoint = remote.endpoint.clone().ok_or_else(|| {
                HinaError::config("remote.endpoint is required for the http archive")
            })?;
            let bucket = remote.bucket.clone().ok_or_else(|| {
                HinaError::config("remote.bucket is required for the http archive")
            })?;
            let archive = HttpArchive::new(
                endpoint,
                bucket,
                Duration::from_secs(remote.timeout_seconds),
            )?
            .with_token(remote.token.clone())
            .with_public_domain(remote.public_domain.clone());
            Ok(Arc::new(archive))
        }
    }
}

/// Content type implied by a snapshot key
pub(crate) fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".gz") {
        "application/gzip"
    } else {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_archive_requires_endpoint_and_bucket() {
        let mut config = ArchiveConfig::default();
        config.remote.kind = RemoteKind::Http;
        assert!(archive_from_config(&config).is_err());

        config.remote.endpoint = Some("https://objects.example.com".to_string());
        config.remote.bucket = Some("hina".to_string());
        let archive = archive_from_config(&config).unwrap();
        assert_eq!(archive.name(), "http");
    }

    #[test]
    fn test_local_archive_is_default() {
        let archive = archive_from_config(&ArchiveConfig::default()).unwrap();
        assert_eq!(archive.name(), "local");
    }
}
