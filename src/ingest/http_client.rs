use crate::config::SourceConfig;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP error {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl FetchError {
    /// Worth another attempt: connection trouble, rate limiting, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::Build(_) | FetchError::Body(_) => false,
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: u32,
    retry_base_ms: u64,
}

impl HttpClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(FetchError::Build)?;

        Ok(Self {
            inner,
            max_retries: config.max_retries,
            retry_base_ms: config.retry_base_ms,
        })
    }

    /// Fetch a URL as text, retrying transient failures with jittered backoff.
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.retry_base_ms.max(1))
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries as usize);

        let mut attempt = 0u32;
        RetryIf::spawn(
            strategy,
            || {
                attempt += 1;
                self.get_once(url, attempt)
            },
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    warn!("Fetch failed ({}), retrying", e);
                }
                retry
            },
        )
        .await
    }

    async fn get_once(&self, url: &Url, attempt: u32) -> Result<String, FetchError> {
        debug!("GET {} (attempt {})", url, attempt);

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.text().await.map_err(FetchError::Body)
    }
}
