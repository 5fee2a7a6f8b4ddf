pub mod detail;
pub mod incremental;
pub mod listing;
pub mod validate;

// Re-export command functions for convenience
pub use detail::{detail, DetailParams};
pub use incremental::{incremental, IncrementalParams};
pub use listing::{configurable, regions, simple, ConfigurableParams};
pub use validate::validate;

use anyhow::{Context, Result};
use portal_crawler::config::{Config, ThrottleConfig};
use portal_crawler::crawler::PoliteFetcher;
use portal_crawler::models::RecordTable;
use portal_crawler::utils::format_thousands;

/// Fetcher for a listing run; `delay` replaces the randomized pacing
pub(crate) fn listing_fetcher(config: &Config, delay: Option<f64>) -> Result<PoliteFetcher> {
    let throttle = match delay {
        Some(secs) => ThrottleConfig::fixed(secs),
        None => config.throttle.clone(),
    };
    PoliteFetcher::with_throttle(config, throttle).context("Failed to create HTTP client")
}

/// `$min - $max` over the price column, when any price is present
pub(crate) fn price_range(table: &RecordTable) -> Option<(f64, f64)> {
    let prices = table.numbers("precio");
    let min = prices.iter().copied().reduce(f64::min)?;
    let max = prices.iter().copied().reduce(f64::max)?;
    Some((min, max))
}

pub(crate) fn money(value: f64) -> String {
    format!("${}", format_thousands(value))
}

pub(crate) fn banner(title: &str) {
    println!("{}", "=".repeat(70));
    println!("  {title}");
    println!("{}", "=".repeat(70));
}
