//! Configuration management for the portal crawler
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Every section has defaults matching the pacing
//! that keeps long runs unblocked, so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::crawler::headers::{DEFAULT_ACCEPT_LANGUAGE, USER_AGENTS};
use crate::utils::retry::{secs_to_duration, DEFAULT_RETRY_AFTER_MAX_SECS};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request pacing
    pub throttle: ThrottleConfig,

    /// Transport-level retries and connection pool
    pub transport: TransportConfig,

    /// Manual retry policy and request identity
    pub fetch: FetchConfig,

    /// Batch checkpoint/resume behaviour
    pub batch: BatchConfig,

    /// Validation pass rules
    pub validation: ValidationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Throttler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Lower bound of the per-request pause in seconds
    pub min_delay_secs: f64,

    /// Upper bound of the per-request pause in seconds
    pub max_delay_secs: f64,

    /// Take a long pause every N requests (0 disables)
    pub long_pause_every: u64,

    /// Lower bound of the long pause in seconds
    pub long_pause_min_secs: f64,

    /// Upper bound of the long pause in seconds
    pub long_pause_max_secs: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 4.0,
            max_delay_secs: 10.0,
            long_pause_every: 30,
            long_pause_min_secs: 90.0,
            long_pause_max_secs: 180.0,
        }
    }
}

impl ThrottleConfig {
    /// A fixed pause before every request and no long pauses
    pub fn fixed(delay_secs: f64) -> Self {
        Self {
            min_delay_secs: delay_secs,
            max_delay_secs: delay_secs,
            long_pause_every: 0,
            ..Default::default()
        }
    }

    /// No pacing at all
    pub fn disabled() -> Self {
        Self::fixed(0.0)
    }
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Automatic retries for connect failures, read failures and retryable statuses
    pub max_retries: u32,

    /// Retry `k` (0-based) waits `backoff_factor * 2^k` seconds
    pub backoff_factor: f64,

    /// Cap for the computed backoff in seconds
    pub backoff_max_secs: f64,

    /// Extra uniform jitter `[0, backoff_jitter_secs)` added to the backoff
    pub backoff_jitter_secs: f64,

    /// Status codes retried automatically
    pub retry_statuses: Vec<u16>,

    /// Let a server `Retry-After` override the computed backoff
    pub respect_retry_after: bool,

    /// Longest `Retry-After` honoured, in seconds
    pub retry_after_max_secs: f64,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Enable cookie persistence
    pub enable_cookies: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff_factor: 1.0,
            backoff_max_secs: 120.0,
            backoff_jitter_secs: 0.0,
            retry_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
            retry_after_max_secs: DEFAULT_RETRY_AFTER_MAX_SECS,
            pool_max_idle_per_host: 20,
            connect_timeout_secs: 10,
            enable_cookies: true,
        }
    }
}

impl TransportConfig {
    /// Transport that never retries on its own
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Fetch policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Manual retries for 429 and 5xx responses
    pub max_manual_retries: u32,

    /// Rate-limited responses tolerated over a whole run; past it a 429
    /// fails the fetch instead of waiting
    pub rate_limit_budget: u32,

    /// Longest `Retry-After` honoured on a 429, in seconds
    pub retry_after_max_secs: f64,

    /// Pool of browser identity strings
    pub user_agents: Vec<String>,

    /// Accept-Language sent with browser headers
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 25,
            max_manual_retries: 2,
            rate_limit_budget: 50,
            retry_after_max_secs: DEFAULT_RETRY_AFTER_MAX_SECS,
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Flush the accumulator every N processed items (0 flushes only at the end)
    pub checkpoint_every: usize,

    /// Skip items already present in an existing output file
    pub resume: bool,

    /// Stop when a page yields no records
    pub stop_on_empty: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: 100,
            resume: true,
            stop_on_empty: false,
        }
    }
}

/// Allowed range for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

impl RangeRule {
    pub fn new(column: &str, min: f64, max: f64) -> Self {
        Self {
            column: column.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Validation pass configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Smallest acceptable price
    pub price_min: f64,

    /// Largest acceptable price
    pub price_max: f64,

    /// Per-attribute ranges; nulls always pass
    pub ranges: Vec<RangeRule>,

    /// Identifier columns tried in order for deduplication
    pub identifier_columns: Vec<String>,

    /// Composite key used when no identifier column exists
    pub composite_key: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            price_min: 10_000.0,
            price_max: 50_000_000.0,
            ranges: vec![
                RangeRule::new("dormitorios", 1.0, 20.0),
                RangeRule::new("banos", 1.0, 15.0),
                RangeRule::new("superficie_util", 10.0, 2000.0),
            ],
            identifier_columns: vec![String::from("url"), String::from("link")],
            composite_key: vec![String::from("titulo"), String::from("precio")],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Reject waits that are not finite, negative or too large for a `Duration`
fn check_secs(name: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 || secs_to_duration(secs).is_none() {
        anyhow::bail!("{name} must be a finite, non-negative number of seconds (got {secs})");
    }
    Ok(())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Defaults overridden by `PORTAL_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORTAL_*` overrides on top of the current values
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("PORTAL_MIN_DELAY") {
            self.throttle.min_delay_secs = v;
        }
        if let Some(v) = env_parse("PORTAL_MAX_DELAY") {
            self.throttle.max_delay_secs = v;
        }
        if let Some(v) = env_parse("PORTAL_LONG_PAUSE_EVERY") {
            self.throttle.long_pause_every = v;
        }
        if let Some(v) = env_parse("PORTAL_MAX_RETRIES") {
            self.transport.max_retries = v;
        }
        if let Some(v) = env_parse("PORTAL_BACKOFF_FACTOR") {
            self.transport.backoff_factor = v;
        }
        if let Some(v) = env_parse("PORTAL_TIMEOUT") {
            self.fetch.timeout_secs = v;
        }
        if let Some(v) = env_parse("PORTAL_MAX_MANUAL_RETRIES") {
            self.fetch.max_manual_retries = v;
        }
        if let Some(v) = env_parse("PORTAL_RATE_LIMIT_BUDGET") {
            self.fetch.rate_limit_budget = v;
        }
        if let Some(v) = env_parse("PORTAL_CHECKPOINT_EVERY") {
            self.batch.checkpoint_every = v;
        }
        if let Ok(level) = std::env::var("PORTAL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PORTAL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let t = &self.throttle;
        check_secs("min_delay_secs", t.min_delay_secs)?;
        check_secs("max_delay_secs", t.max_delay_secs)?;
        check_secs("long_pause_min_secs", t.long_pause_min_secs)?;
        check_secs("long_pause_max_secs", t.long_pause_max_secs)?;
        if t.min_delay_secs > t.max_delay_secs {
            anyhow::bail!(
                "min_delay_secs ({}) must not exceed max_delay_secs ({})",
                t.min_delay_secs,
                t.max_delay_secs
            );
        }
        if t.long_pause_min_secs > t.long_pause_max_secs {
            anyhow::bail!("long pause range is invalid");
        }

        let tr = &self.transport;
        check_secs("backoff_factor", tr.backoff_factor)?;
        check_secs("backoff_max_secs", tr.backoff_max_secs)?;
        check_secs("backoff_jitter_secs", tr.backoff_jitter_secs)?;
        check_secs("transport.retry_after_max_secs", tr.retry_after_max_secs)?;
        if self.transport.pool_max_idle_per_host == 0 {
            anyhow::bail!("pool_max_idle_per_host must be greater than 0");
        }

        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }
        if self.fetch.user_agents.is_empty() {
            anyhow::bail!("user_agents pool must not be empty");
        }
        check_secs("fetch.retry_after_max_secs", self.fetch.retry_after_max_secs)?;

        let v = &self.validation;
        if !v.price_min.is_finite() || !v.price_max.is_finite() {
            anyhow::bail!("price bounds must be finite");
        }
        if v.price_min > v.price_max {
            anyhow::bail!("price_min must not exceed price_max");
        }
        for rule in &v.ranges {
            if rule.min.is_nan() || rule.max.is_nan() || rule.min > rule.max {
                anyhow::bail!("range for {} is inverted", rule.column);
            }
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("unknown log format: {other}"),
        }

        Ok(())
    }
}
