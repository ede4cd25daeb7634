//! HTTP image fetching adapter.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::RgbaImage;
use reqwest::Client;
use tracing::{debug, warn};

use crate::domain::errors::FetchError;
use crate::domain::ports::ImageFetchPort;

/// Default timeout covering the whole download.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Browser-style user agent for arbitrary image hosts; some CDNs reject
/// unknown clients outright.
const HTTP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches remote images over HTTP and decodes them to RGBA.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the default timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a fetcher with a custom timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(HTTP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Downloads the raw body. Malformed URLs are rejected up front.
    async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| FetchError::invalid_url(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_connect() {
                FetchError::network("failed to connect")
            } else {
                FetchError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::network(format!("HTTP {status}")));
        }

        response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::network(format!("failed to read body: {e}"))
            }
        })
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
        debug!(url = %url, "Fetching image");
        let bytes = self.download(url).await?;
        debug!(url = %url, size = bytes.len(), "Downloaded image, decoding");

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| FetchError::undecodable(format!("decode task failed: {e}")))?
            .map_err(|e| {
                warn!(url = %url, error = %e, "Image decode failed");
                FetchError::undecodable(e.to_string())
            })?;

        Ok(decoded.to_rgba8())
    }
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher").finish_non_exhaustive()
    }
}
