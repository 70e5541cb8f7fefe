//! Access to source files and their manifests.
//!
//! [`HttpSource`] issues plain GETs for manifests and `Range` requests for
//! single messages, retrying transient failures with exponential backoff.
//! A 404 on a manifest is reported as [`ExtractError::Unavailable`] and is
//! never retried.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ExtractError, Result};
use crate::manifest::ByteRange;

/// Trait for sources that serve manifests and message byte ranges.
#[async_trait]
pub trait GribSource: Send + Sync {
    /// Fetch a manifest and return its lines.
    async fn fetch_manifest(&self, manifest_url: &str) -> Result<Vec<String>>;

    /// Fetch one byte range of a file.
    async fn fetch_range(&self, file_url: &str, range: &ByteRange) -> Result<Bytes>;
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles each retry)
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            connect_timeout_secs: 30,
            max_retries: 3,
            initial_retry_delay_ms: 1000,
            max_retry_delay_ms: 30_000,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

/// Outcome of a single failed attempt.
enum Attempt {
    Retry(ExtractError),
    Fail(ExtractError),
}

/// Source backed by an HTTP(S) endpoint.
pub struct HttpSource {
    client: Client,
    config: HttpConfig,
}

impl HttpSource {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn with_retry<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, Attempt>>,
    {
        let mut retry_count = 0;
        let mut delay = self.config.initial_retry_delay();

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(Attempt::Fail(e)) => return Err(e),
                Err(Attempt::Retry(e)) => {
                    retry_count += 1;
                    if retry_count > self.config.max_retries {
                        return Err(e);
                    }

                    warn!(
                        url = %url,
                        error = %e,
                        retry = retry_count,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.config.max_retry_delay());
                }
            }
        }
    }
}

fn network(url: &str, message: impl ToString) -> ExtractError {
    ExtractError::Network {
        url: url.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl GribSource for HttpSource {
    #[instrument(skip(self), fields(url = %manifest_url))]
    async fn fetch_manifest(&self, manifest_url: &str) -> Result<Vec<String>> {
        let body = self
            .with_retry(manifest_url, move || async move {
                let response = self
                    .client
                    .get(manifest_url)
                    .send()
                    .await
                    .map_err(|e| Attempt::Retry(network(manifest_url, e)))?;

                match response.status() {
                    StatusCode::OK => response
                        .text()
                        .await
                        .map_err(|e| Attempt::Retry(network(manifest_url, e))),
                    StatusCode::NOT_FOUND => Err(Attempt::Fail(ExtractError::Unavailable {
                        url: manifest_url.to_string(),
                    })),
                    status if status.is_server_error() => Err(Attempt::Retry(network(
                        manifest_url,
                        format!("HTTP error: {}", status),
                    ))),
                    status => Err(Attempt::Fail(network(
                        manifest_url,
                        format!("HTTP error: {}", status),
                    ))),
                }
            })
            .await?;

        let lines: Vec<String> = body
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        debug!(entries = lines.len(), "Fetched manifest");
        Ok(lines)
    }

    #[instrument(skip(self), fields(url = %file_url, range = %range))]
    async fn fetch_range(&self, file_url: &str, range: &ByteRange) -> Result<Bytes> {
        let range_err = |message: String| ExtractError::RangeFetch {
            url: file_url.to_string(),
            range: range.to_string(),
            message,
        };

        let bytes = self
            .with_retry(file_url, move || async move {
                let response = self
                    .client
                    .get(file_url)
                    .header(header::RANGE, range.header_value())
                    .send()
                    .await
                    .map_err(|e| Attempt::Retry(range_err(e.to_string())))?;

                match response.status() {
                    StatusCode::OK | StatusCode::PARTIAL_CONTENT => response
                        .bytes()
                        .await
                        .map_err(|e| Attempt::Retry(range_err(e.to_string()))),
                    status if status.is_server_error() => {
                        Err(Attempt::Retry(range_err(format!("HTTP error: {}", status))))
                    }
                    status => Err(Attempt::Fail(range_err(format!("HTTP error: {}", status)))),
                }
            })
            .await?;

        debug!(size = bytes.len(), "Fetched byte range");
        Ok(bytes)
    }
}
