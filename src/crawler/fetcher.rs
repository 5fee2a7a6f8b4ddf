//! Polite fetching with manual retries
//!
//! This module provides the fetch layer used by every scraper:
//! - Throttling before every attempt, retries included
//! - User-Agent rotation from a configured pool
//! - Rate-limit handling that honours numeric `Retry-After`
//! - Bounded manual retries for sustained server errors
//! - Charset-aware body decoding

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, FetchConfig, ThrottleConfig};
use crate::crawler::clock::{SharedSleeper, TokioSleeper};
use crate::crawler::headers::{build_browser_headers, ensure_user_agent, random_user_agent};
use crate::crawler::throttle::Throttler;
use crate::crawler::transport::RetryingTransport;
use crate::utils::error::FetchError;
use crate::utils::retry::{manual_backoff, numeric_retry_after};

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl FetchResponse {
    pub fn new(url: impl Into<String>, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
        }
    }

    /// Final URL after redirects
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into `FetchError::Status`
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                status: self.status(),
                url: self.url,
            })
        }
    }

    /// Decode the body as text
    ///
    /// The `Content-Type` charset wins when it names a known encoding.
    /// Otherwise UTF-8 is tried first and Windows-1252 (a superset of
    /// Latin-1, common on older Spanish-language pages) is the fallback.
    pub fn text(&self) -> Result<String, FetchError> {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        decode_bytes(&self.body, content_type)
    }
}

/// Decode bytes using the declared charset, then UTF-8, then Windows-1252
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    if let Some(encoding) = charset_of(content_type) {
        let (cow, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok(cow.into_owned());
        }
        tracing::debug!(charset = encoding.name(), "Declared charset failed, sniffing");
    }

    let (cow, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return Ok(cow.into_owned());
    }

    let (cow, _, had_errors) = WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(FetchError::Decode(
            "Failed to decode content with UTF-8 or Windows-1252".to_string(),
        ));
    }
    Ok(cow.into_owned())
}

fn charset_of(content_type: &str) -> Option<&'static Encoding> {
    let lower = content_type.to_ascii_lowercase();
    let label = lower.split("charset=").nth(1)?;
    let label = label.split(';').next()?.trim().trim_matches('"');
    Encoding::for_label(label.as_bytes())
}

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    RateLimited,
    ServerError,
    ClientError,
    /// 1xx/3xx: returned as-is
    Other,
}

pub fn classify(status: u16) -> Classification {
    match status {
        200..=299 => Classification::Success,
        429 => Classification::RateLimited,
        400..=499 => Classification::ClientError,
        500..=599 => Classification::ServerError,
        _ => Classification::Other,
    }
}

/// Fetch layer combining throttler, transport and manual retries
pub struct PoliteFetcher {
    transport: RetryingTransport,
    throttler: Throttler,
    config: FetchConfig,
    sleeper: SharedSleeper,
    rate_limited: u64,
}

impl PoliteFetcher {
    pub fn new(transport: RetryingTransport, throttler: Throttler, config: FetchConfig) -> Self {
        Self::with_sleeper(transport, throttler, config, Arc::new(TokioSleeper))
    }

    /// Fetcher whose manual-retry waits go through `sleeper`
    pub fn with_sleeper(
        transport: RetryingTransport,
        throttler: Throttler,
        config: FetchConfig,
        sleeper: SharedSleeper,
    ) -> Self {
        Self {
            transport,
            throttler,
            config,
            sleeper,
            rate_limited: 0,
        }
    }

    /// Build a fetcher from the full configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::with_throttle(config, config.throttle.clone())
    }

    /// Like [`PoliteFetcher::from_config`] with an overridden pacing
    pub fn with_throttle(config: &Config, throttle: ThrottleConfig) -> Result<Self, FetchError> {
        let transport = RetryingTransport::new(config.transport.clone())?;
        Ok(Self::new(
            transport,
            Throttler::new(throttle),
            config.fetch.clone(),
        ))
    }

    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Rate-limited responses seen over the fetcher's lifetime
    pub fn rate_limited_total(&self) -> u64 {
        self.rate_limited
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Fetch `url`, pacing every attempt
    ///
    /// 2xx, 4xx other than 429 and 1xx/3xx responses are returned at once.
    /// 429 waits for a numeric `Retry-After` (capped at
    /// `retry_after_max_secs`) or the manual backoff and tries again; once
    /// `max_manual_retries` retries are spent the last 429 is returned after
    /// its wait. 5xx is retried while `attempt < max_manual_retries`, then
    /// the failing response is returned.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::RetryBudgetExhausted` when a 429 arrives after the
    /// run-wide rate-limit budget is spent, or the transport's error when no
    /// response could be obtained.
    pub async fn fetch(
        &mut self,
        url: &str,
        headers: Option<HeaderMap>,
    ) -> Result<FetchResponse, FetchError> {
        let headers = self.prepare_headers(headers)?;
        let timeout = self.config.timeout();
        let mut attempt: u32 = 0;

        loop {
            self.throttler.wait_before_request().await;
            let response = self.transport.get(url, &headers, timeout).await?;
            let status = response.status();

            let (wait, last) = match classify(status) {
                Classification::Success
                | Classification::ClientError
                | Classification::Other => return Ok(response),
                Classification::RateLimited => {
                    self.rate_limited += 1;
                    if self.rate_limited > u64::from(self.config.rate_limit_budget) {
                        tracing::error!(
                            url = %url,
                            attempts = attempt + 1,
                            rate_limited = self.rate_limited,
                            "Rate-limit budget exhausted"
                        );
                        return Err(FetchError::RetryBudgetExhausted {
                            attempts: attempt + 1,
                            last_status: status,
                        });
                    }
                    let wait = numeric_retry_after(
                        response.headers(),
                        self.config.retry_after_max_secs,
                    )
                    .unwrap_or_else(|| manual_backoff(attempt));
                    (wait, attempt >= self.config.max_manual_retries)
                }
                Classification::ServerError => {
                    if attempt >= self.config.max_manual_retries {
                        tracing::warn!(url = %url, status, attempts = attempt + 1, "Giving up on server error");
                        return Ok(response);
                    }
                    (manual_backoff(attempt), false)
                }
            };

            if last {
                tracing::warn!(
                    url = %url,
                    attempts = attempt + 1,
                    wait_secs = wait.as_secs_f64(),
                    "Still rate limited, returning after the final wait"
                );
                self.sleeper.sleep(wait).await;
                return Ok(response);
            }

            tracing::warn!(
                url = %url,
                status,
                attempt,
                wait_secs = wait.as_secs_f64(),
                "Retrying after backoff"
            );
            self.sleeper.sleep(wait).await;
            attempt += 1;
        }
    }

    /// Fetch and decode a page, treating any non-2xx outcome as an error
    pub async fn fetch_text(&mut self, url: &str) -> Result<String, FetchError> {
        let response = self.fetch(url, None).await?.error_for_status()?;
        response.text()
    }

    fn prepare_headers(&self, headers: Option<HeaderMap>) -> Result<HeaderMap, FetchError> {
        match headers {
            None => build_browser_headers(
                random_user_agent(&self.config.user_agents),
                &self.config.accept_language,
            ),
            Some(mut headers) => {
                ensure_user_agent(&mut headers, &self.config.user_agents)?;
                Ok(headers)
            }
        }
    }
}
