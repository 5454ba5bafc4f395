//! Rate-limited, retrying HTTP fetcher
//!
//! All page and binary downloads go through here. The retry budget covers
//! 5xx and transport errors; some upstreams signal recoverable rate
//! limiting with 400, which is retried only when the jurisdiction opts in
//! via `http.retry_on_400`.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use thiserror::Error;

use legiwire_common::config::HttpConfig;

/// Fetch client errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A downloaded response body with the metadata the registrar needs
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub body: Vec<u8>,
    pub mimetype: String,
    pub encoding: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// Byte-fetching seam
///
/// The registrar depends on this trait rather than on reqwest so tests can
/// script responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}

/// Production fetcher: reqwest + governor + bounded retries
pub struct FetchClient {
    client: reqwest::Client,
    rate_limiter: Option<DefaultDirectRateLimiter>,
    retry_attempts: u32,
    retry_on_400: bool,
}

impl FetchClient {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let rate_limiter = NonZeroU32::new(config.rate_limit_per_sec)
            .map(|per_sec| RateLimiter::direct(Quota::per_second(per_sec)));

        Ok(Self {
            client,
            rate_limiter,
            retry_attempts: config.retry_attempts.max(1),
            retry_on_400: config.retry_on_400,
        })
    }

    /// True when a status is worth another attempt under this policy
    fn retryable_status(&self, status: u16) -> bool {
        status >= 500 || (status == 400 && self.retry_on_400)
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedContent, FetchError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mimetype = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let encoding = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split("charset=").nth(1))
            .map(|v| v.trim().to_string());
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(FetchedContent {
            body,
            mimetype,
            encoding,
            headers,
        })
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    /// Fetch with exponential backoff
    ///
    /// **Backoff:** 10ms initial, doubling, capped at 1s, for
    /// `retry_attempts` total attempts.
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let mut backoff_ms = 10u64;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(content) => {
                    if attempt > 1 {
                        tracing::debug!(url = url, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(content);
                }
                Err(e) => {
                    let retryable = match &e {
                        FetchError::Network { .. } => true,
                        FetchError::Status { status, .. } => self.retryable_status(*status),
                        FetchError::Client(_) => false,
                    };
                    if !retryable || attempt >= self.retry_attempts {
                        return Err(e);
                    }
                    tracing::warn!(
                        url = url,
                        attempt,
                        backoff_ms,
                        error = %e,
                        "Fetch failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(1000);
                }
            }
        }
    }
}
