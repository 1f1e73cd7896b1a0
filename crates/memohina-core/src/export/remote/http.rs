//! Object storage over HTTP PUT

use super::{RemoteArchive, content_type_for};
use crate::error::{HinaError, HinaResult, RemoteStoreError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Uploads snapshots with `PUT <endpoint>/<bucket>/<key>`.
///
/// Works with S3-compatible gateways and plain WebDAV-style servers. Every
/// request carries `If-None-Match: *` so the server rejects an overwrite.
#[derive(Debug, Clone)]
pub struct HttpArchive {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
    public_domain: Option<String>,
}

impl HttpArchive {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> HinaResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| HinaError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into().trim_matches('/').to_string(),
            token: None,
            public_domain: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_public_domain(mut self, domain: Option<String>) -> Self {
        self.public_domain = domain.filter(|d| !d.is_empty());
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Locator handed back to users
    pub fn public_url(&self, key: &str) -> String {
        match &self.public_domain {
            Some(domain) if domain.starts_with("http://") || domain.starts_with("https://") => {
                format!("{}/{}", domain.trim_end_matches('/'), key)
            }
            Some(domain) => format!("https://{}/{}", domain.trim_end_matches('/'), key),
            None => self.object_url(key),
        }
    }
}

/// Map a non-success upload status onto the archive error kinds
pub(crate) fn classify_status(status: StatusCode, body: String) -> RemoteStoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteStoreError::Auth(body),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => RemoteStoreError::Conflict(body),
        StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::INSUFFICIENT_STORAGE => RemoteStoreError::Quota(body),
        _ => RemoteStoreError::Rejected {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl RemoteArchive for HttpArchive {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, RemoteStoreError> {
        let url = self.object_url(key);
        debug!(key, bytes = bytes.len(), "uploading snapshot");

        let mut request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type_for(key))
            .header(IF_NONE_MATCH, "*")
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteStoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(key, %status, "snapshot upload rejected");
            return Err(classify_status(status, body));
        }

        Ok(self.public_url(key))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn archive(endpoint: &str) -> HttpArchive {
        HttpArchive::new(endpoint, "bucket", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_public_url_variants() {
        let plain = archive("https://objects.example.com/");
        assert_eq!(
            plain.public_url("memory/k/a.json"),
            "https://objects.example.com/bucket/memory/k/a.json"
        );

        let custom = plain
            .clone()
            .with_public_domain(Some("hina.example.com".to_string()));
        assert_eq!(custom.public_url("a.json"), "https://hina.example.com/a.json");

        let schemed = plain.with_public_domain(Some("http://localhost:9000/".to_string()));
        assert_eq!(schemed.public_url("a.json"), "http://localhost:9000/a.json");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            RemoteStoreError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::PRECONDITION_FAILED, String::new()),
            RemoteStoreError::Conflict(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            RemoteStoreError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "down".to_string()),
            RemoteStoreError::Rejected { status: 502, .. }
        ));
    }

    /// Accept one request, capture its head and answer with `status_line`
    async fn serve_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= head_end + 4 + length || n == 0 {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&received).to_string()
    }

    #[tokio::test]
    async fn test_put_sends_conditional_authenticated_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 200 OK"));

        let archive = archive(&endpoint).with_token(Some("secret".to_string()));
        let url = archive.put("memory/k/a.json", b"{}".to_vec()).await.unwrap();
        let request = server.await.unwrap().to_lowercase();

        assert_eq!(url, format!("{}/bucket/memory/k/a.json", endpoint));
        assert!(request.starts_with("put /bucket/memory/k/a.json"));
        assert!(request.contains("if-none-match: *"));
        assert!(request.contains("authorization: bearer secret"));
        assert!(request.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn test_existing_object_is_a_conflict() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 412 Precondition Failed"));

        let result = archive(&endpoint).put("a.json", b"{}".to_vec()).await;
        server.await.unwrap();
        assert!(matches!(result, Err(RemoteStoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let result = archive(&endpoint).put("a.json", b"{}".to_vec()).await;
        assert!(matches!(result, Err(RemoteStoreError::Network(_))));
    }
}
