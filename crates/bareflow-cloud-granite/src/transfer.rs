//! Image byte transfer
//!
//! Resolves an image source (local path or http/https URL) to a byte stream
//! and pushes it to the short-lived upload URL handed out when a project
//! image is registered. Upload is an authenticated streaming POST with a
//! bearer token.

use crate::error::{GraniteError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Where image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    LocalFile(String),
    HttpUrl(String),
}

impl ImageSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            ImageSource::HttpUrl(source.to_string())
        } else {
            ImageSource::LocalFile(source.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageSource::LocalFile(p) => p,
            ImageSource::HttpUrl(u) => u,
        }
    }
}

/// Byte-transfer capability consumed by the project-image reconciler.
#[async_trait]
pub trait ImageTransfer: Send + Sync {
    /// Resolve a source to a byte stream.
    async fn open(&self, source: &str) -> Result<reqwest::Body>;

    /// Push a byte stream to the upload URL.
    async fn upload(&self, url: &str, token: &str, body: reqwest::Body) -> Result<()>;
}

/// Streaming HTTP implementation.
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        // Dedicated client: image payloads are large, so generous connect
        // timeout and a long idle pool.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(300))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageTransfer for HttpTransfer {
    async fn open(&self, source: &str) -> Result<reqwest::Body> {
        match ImageSource::parse(source) {
            ImageSource::LocalFile(path) => {
                let file = File::open(&path).await.map_err(|err| GraniteError::SourceOpen {
                    source_path: path,
                    source: err,
                })?;
                Ok(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            }
            ImageSource::HttpUrl(url) => {
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(GraniteError::SourceDownload)?;
                Ok(reqwest::Body::wrap_stream(response.bytes_stream()))
            }
        }
    }

    async fn upload(&self, url: &str, token: &str, body: reqwest::Body) -> Result<()> {
        tracing::debug!(url, "uploading image payload");
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .bearer_auth(token)
            .body(body)
            .send()
            .await
            .map_err(GraniteError::Upload)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraniteError::UploadStatus(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn source_parse_distinguishes_url_from_path() {
        assert_eq!(
            ImageSource::parse("https://mirror.example.com/debian.raw"),
            ImageSource::HttpUrl("https://mirror.example.com/debian.raw".into())
        );
        assert_eq!(
            ImageSource::parse("/var/images/debian.raw"),
            ImageSource::LocalFile("/var/images/debian.raw".into())
        );
        // No scheme means local, even for relative paths.
        assert_eq!(
            ImageSource::parse("images/debian.raw"),
            ImageSource::LocalFile("images/debian.raw".into())
        );
    }

    #[tokio::test]
    async fn open_local_file_streams_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"image-bytes").unwrap();

        let transfer = HttpTransfer::new();
        let body = transfer.open(file.path().to_str().unwrap()).await.unwrap();
        // A streaming body has no known length up front.
        assert!(body.as_bytes().is_none());
    }

    #[tokio::test]
    async fn open_missing_file_names_the_path() {
        let transfer = HttpTransfer::new();
        let err = transfer.open("/does/not/exist.raw").await.unwrap_err();
        assert!(err.to_string().contains("/does/not/exist.raw"));
    }
}
