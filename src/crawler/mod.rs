//! Polite crawling of the rental portal
//!
//! This module implements the fetch path and the batch loop that drives it:
//! a [`Throttler`] paces every attempt, a [`RetryingTransport`] absorbs short
//! network hiccups, [`PoliteFetcher`] handles rate limiting and sustained
//! server errors, and [`BatchRunner`] walks work items with checkpoints.

pub mod batch;
pub mod clock;
pub mod detail;
pub mod fetcher;
pub mod headers;
pub mod list;
pub mod throttle;
pub mod transport;
pub mod url;

pub use batch::{BatchRunner, BatchSummary, ItemScraper, WorkItem};
pub use clock::{RecordingSleeper, SharedSleeper, Sleeper, TokioSleeper};
pub use detail::DetailScraper;
pub use fetcher::{classify, Classification, FetchResponse, PoliteFetcher};
pub use list::ListingPageScraper;
pub use throttle::Throttler;
pub use transport::RetryingTransport;
pub use url::{default_region_plan, listing_url, page_url, PropertyType, Region, RegionPlan};
