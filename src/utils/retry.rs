//! Backoff and Retry-After arithmetic
//!
//! Both retry layers share these helpers: the transport uses the
//! `backoff_factor * 2^k` schedule, the manual fetch layer uses the capped
//! `8 * 2^attempt + jitter` schedule. Everything here is pure so the waits can
//! be asserted without sleeping.

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// Base of the manual backoff schedule in seconds
pub const MANUAL_BACKOFF_BASE_SECS: f64 = 8.0;

/// Upper bound of the manual backoff schedule in seconds
pub const MANUAL_BACKOFF_CAP_SECS: f64 = 90.0;

/// Exclusive upper bound of the manual backoff jitter in seconds
pub const MANUAL_JITTER_MAX_SECS: f64 = 5.0;

/// Largest exponent used when computing `2^attempt`
const MAX_EXPONENT: u32 = 30;

/// Longest wait any computed backoff or pause may produce
const MAX_WAIT_SECS: f64 = u32::MAX as f64;

/// Default ceiling for a server-supplied `Retry-After`
pub const DEFAULT_RETRY_AFTER_MAX_SECS: f64 = 300.0;

/// Convert seconds to a `Duration`, rejecting values it cannot hold
///
/// Negative values clamp to zero. NaN, infinities and values past
/// `Duration::MAX` yield `None`.
pub fn secs_to_duration(secs: f64) -> Option<Duration> {
    if secs.is_nan() {
        return None;
    }
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}

/// Convert a computed wait to a `Duration`, saturating at `MAX_WAIT_SECS`
fn bounded_secs(secs: f64) -> Duration {
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.clamp(0.0, MAX_WAIT_SECS))
}

/// Manual backoff for `attempt` with a freshly drawn jitter in `[0, 5)`
///
/// Returns `min(90, 8 * 2^attempt + jitter)` seconds.
pub fn manual_backoff(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..MANUAL_JITTER_MAX_SECS);
    manual_backoff_with_jitter(attempt, jitter)
}

/// Manual backoff with an explicit jitter value
pub fn manual_backoff_with_jitter(attempt: u32, jitter_secs: f64) -> Duration {
    let exponential = MANUAL_BACKOFF_BASE_SECS * 2f64.powi(attempt.min(MAX_EXPONENT) as i32);
    let secs = (exponential + jitter_secs.max(0.0)).min(MANUAL_BACKOFF_CAP_SECS);
    bounded_secs(secs)
}

/// Transport backoff for the 0-based retry `k`: `factor * 2^k`, capped
pub fn exponential_backoff(factor: f64, retry: u32, cap_secs: f64) -> Duration {
    let secs = factor.max(0.0) * 2f64.powi(retry.min(MAX_EXPONENT) as i32);
    bounded_secs(secs.min(cap_secs.max(0.0)))
}

/// Draw a duration uniformly from `[min_secs, max_secs]`
///
/// An inverted or degenerate range yields `min_secs`. Bounds outside
/// `[0, u32::MAX]` seconds are clamped first.
pub fn uniform_secs(min_secs: f64, max_secs: f64) -> Duration {
    let min = bounded_secs(min_secs).as_secs_f64();
    let max = bounded_secs(max_secs).as_secs_f64();
    if max <= min {
        return bounded_secs(min);
    }
    bounded_secs(rand::thread_rng().gen_range(min..=max))
}

/// Read a numeric `Retry-After` header
///
/// Only the delta-seconds form is accepted here; fractional values are
/// allowed and negative values clamp to zero. Values that do not fit a
/// `Duration` are ignored, and the result never exceeds `max_secs`.
pub fn numeric_retry_after(headers: &HeaderMap, max_secs: f64) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let wait = secs_to_duration(raw.parse::<f64>().ok()?)?;
    Some(wait.min(bounded_secs(max_secs)))
}

/// Parse a `Retry-After` value given either as seconds or as an HTTP-date
///
/// The result is capped at `max_secs`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>, max_secs: f64) -> Option<Duration> {
    let value = value.trim();

    let wait = match value.parse::<f64>() {
        Ok(secs) => secs_to_duration(secs)?,
        Err(_) => {
            let when = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
            when.signed_duration_since(now).to_std().unwrap_or(Duration::ZERO)
        }
    };
    Some(wait.min(bounded_secs(max_secs)))
}

/// `Retry-After` from a header map in either accepted form
pub fn retry_after_from_headers(headers: &HeaderMap, max_secs: f64) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(raw, Utc::now(), max_secs)
}
