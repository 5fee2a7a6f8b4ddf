//! Sleep abstraction shared by the throttler and both retry layers
//!
//! Every suspension in the fetch path goes through a [`Sleeper`], so tests can
//! swap in [`RecordingSleeper`] and assert exact waits without wall-clock delay.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the current task
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping via `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately and remembers every requested duration
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    log: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// All durations requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Sum of all requested durations
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut log) = self.log.lock() {
            log.push(duration);
        }
    }
}

/// Shared handle used by the fetch components
pub type SharedSleeper = Arc<dyn Sleeper>;
