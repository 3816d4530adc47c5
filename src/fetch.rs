//! Image acquisition for jobs.
//!
//! Sources are HTTP(S) URLs, `file://` URLs or plain filesystem paths.
//! Downloads can be cached on disk by job id so a resumed run does not
//! fetch the same image twice.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;
use crate::state_machine::JobId;
use crate::writer::write_atomic;

/// Something that can turn a job's source URL into image bytes.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, id: &JobId, source: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpImageFetcher {
    client: Client,
    cache_dir: Option<PathBuf>,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, cache_dir: Option<PathBuf>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, cache_dir })
    }

    fn cache_path(&self, id: &JobId) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(id.as_str()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let fail = |message: String| FetchError {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("status {}", status.as_u16())));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        if bytes.is_empty() {
            return Err(fail("empty response body".to_string()));
        }
        Ok(bytes.to_vec())
    }

    async fn read_local(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        let path = Path::new(source.strip_prefix("file://").unwrap_or(source));
        tokio::fs::read(path).await.map_err(|e| FetchError {
            url: source.to_string(),
            message: e.to_string(),
        })
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, id: &JobId, source: &str) -> Result<Vec<u8>, FetchError> {
        let source = source.trim();
        if !is_remote(source) {
            return self.read_local(source).await;
        }

        let cached = self.cache_path(id);
        if let Some(path) = &cached
            && let Ok(bytes) = tokio::fs::read(path).await
        {
            if !bytes.is_empty() {
                tracing::debug!(job = %id, path = %path.display(), "image served from cache");
                return Ok(bytes);
            }
            tracing::warn!(job = %id, path = %path.display(), "ignoring empty cached image");
        }

        let bytes = self.download(source).await?;
        tracing::debug!(job = %id, bytes = bytes.len(), "image downloaded");

        if let Some(path) = cached
            && let Err(e) = store(path, bytes.clone()).await
        {
            tracing::warn!(job = %id, error = %e, "could not cache image");
        }
        Ok(bytes)
    }
}

/// Cache writes are atomic so an interrupted store never leaves a truncated image.
async fn store(path: PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
        .await
        .map_err(io::Error::other)?
}
