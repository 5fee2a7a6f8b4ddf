//! Human-cadence request pacing
//!
//! A randomized pause precedes every request, and every `long_pause_every`
//! requests an additional long pause imitates someone reading a page.

use crate::config::ThrottleConfig;
use crate::crawler::clock::{SharedSleeper, TokioSleeper};
use crate::utils::retry::{secs_to_duration, uniform_secs};
use std::sync::Arc;
use std::time::Duration;

/// Paces outbound requests
pub struct Throttler {
    config: ThrottleConfig,
    sleeper: SharedSleeper,
    request_count: u64,
    long_pauses: u64,
}

impl Throttler {
    /// Throttler that really sleeps
    pub fn new(config: ThrottleConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: ThrottleConfig, sleeper: SharedSleeper) -> Self {
        Self {
            config,
            sleeper,
            request_count: 0,
            long_pauses: 0,
        }
    }

    /// Pause before the next request
    ///
    /// The base pause always happens; the long pause is added when the
    /// post-increment counter is a positive multiple of `long_pause_every`.
    pub async fn wait_before_request(&mut self) {
        self.request_count += 1;

        let base = uniform_secs(self.config.min_delay_secs, self.config.max_delay_secs);
        tracing::debug!(
            request = self.request_count,
            wait_secs = base.as_secs_f64(),
            "Throttle pause"
        );
        self.sleeper.sleep(base).await;

        if self.is_long_pause_due() {
            let long = uniform_secs(
                self.config.long_pause_min_secs,
                self.config.long_pause_max_secs,
            );
            self.long_pauses += 1;
            tracing::info!(
                request = self.request_count,
                wait_secs = long.as_secs_f64(),
                "Long pause"
            );
            self.sleeper.sleep(long).await;
        }
    }

    fn is_long_pause_due(&self) -> bool {
        let every = self.config.long_pause_every;
        every > 0 && self.request_count % every == 0
    }

    /// Requests paced so far
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Long pauses taken so far
    pub fn long_pauses(&self) -> u64 {
        self.long_pauses
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Expected lower bound of the time spent pacing `requests` requests
    ///
    /// Saturates at `Duration::MAX`.
    pub fn minimum_wait_for(&self, requests: u64) -> Duration {
        let base = self.config.min_delay_secs.max(0.0) * requests as f64;
        let long = match self.config.long_pause_every {
            0 => 0.0,
            every => (requests / every) as f64 * self.config.long_pause_min_secs.max(0.0),
        };
        secs_to_duration(base + long).unwrap_or(Duration::MAX)
    }
}
