//! Pooled HTTP transport with automatic retries
//!
//! Connect failures, read failures and retryable statuses are retried up to
//! `max_retries` times with `backoff_factor * 2^k` waits. Exhaustion is silent:
//! the last response is handed back so the fetch layer can classify it.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::TransportConfig;
use crate::crawler::clock::{SharedSleeper, TokioSleeper};
use crate::crawler::fetcher::FetchResponse;
use crate::utils::error::FetchError;
use crate::utils::retry::{exponential_backoff, retry_after_from_headers, uniform_secs};

/// Reusable connection with its own retry policy
pub struct RetryingTransport {
    client: Client,
    config: TransportConfig,
    sleeper: SharedSleeper,
}

impl RetryingTransport {
    /// Create a transport that really sleeps between retries
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: TransportConfig) -> Result<Self, FetchError> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: TransportConfig, sleeper: SharedSleeper) -> Result<Self, FetchError> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .cookie_store(config.enable_cookies)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            config,
            sleeper,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Whether `status` is retried automatically
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.config.retry_statuses.contains(&status)
    }

    /// GET `url`, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for unparseable URLs, and the last
    /// transport error when every attempt failed before a response arrived.
    pub async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let mut retry: u32 = 0;

        loop {
            let can_retry = retry < self.config.max_retries;

            match self.send_once(&parsed, headers, timeout).await {
                Ok(response) => {
                    if can_retry && self.is_retryable_status(response.status()) {
                        let wait = self.backoff(retry, Some(response.headers()));
                        tracing::debug!(
                            url = %url,
                            status = response.status(),
                            retry = retry + 1,
                            wait_secs = wait.as_secs_f64(),
                            "Transport retrying status"
                        );
                        self.sleeper.sleep(wait).await;
                        retry += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) if can_retry && is_transient(&e) => {
                    let wait = self.backoff(retry, None);
                    tracing::debug!(
                        url = %url,
                        error = %e,
                        retry = retry + 1,
                        wait_secs = wait.as_secs_f64(),
                        "Transport retrying error"
                    );
                    self.sleeper.sleep(wait).await;
                    retry += 1;
                }
                Err(e) if e.is_timeout() => return Err(FetchError::Timeout),
                Err(e) => return Err(FetchError::Http(e)),
            }
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<FetchResponse, reqwest::Error> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await?;

        let final_url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body: Bytes = response.bytes().await?;

        Ok(FetchResponse::new(final_url, status, headers, body))
    }

    /// Wait before the 0-based retry `retry`
    fn backoff(&self, retry: u32, headers: Option<&HeaderMap>) -> Duration {
        if self.config.respect_retry_after {
            let max_secs = self.config.retry_after_max_secs;
            if let Some(wait) = headers.and_then(|h| retry_after_from_headers(h, max_secs)) {
                return wait;
            }
        }

        let base = exponential_backoff(
            self.config.backoff_factor,
            retry,
            self.config.backoff_max_secs,
        );
        if self.config.backoff_jitter_secs > 0.0 {
            base.saturating_add(uniform_secs(0.0, self.config.backoff_jitter_secs))
        } else {
            base
        }
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_body() || e.is_decode() || e.is_request()
}
