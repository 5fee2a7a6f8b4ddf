//! portal-crawler - polite real-estate listing crawler
//!
//! Scrapes rental listings from portalinmobiliario.com into CSV files while
//! pacing requests like a careful human visitor, and cleans finished files
//! with a rule-based validator.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Throttling, retrying fetches and the resumable batch loop
//! - [`parser`] - HTML field extraction for listing and detail pages
//! - [`models`] - Records and tables
//! - [`storage`] - CSV persistence, checkpoints and deduplication
//! - [`validation`] - Post-hoc cleaning and reporting
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use portal_crawler::config::Config;
//! use portal_crawler::crawler::{BatchRunner, ListingPageScraper, PoliteFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut fetcher = PoliteFetcher::from_config(&config)?;
//!     let items = ListingPageScraper::page_items(
//!         "https://www.portalinmobiliario.com/arriendo/departamento/metropolitana",
//!         2,
//!     );
//!     let runner = BatchRunner::new(ListingPageScraper::new(), config.batch.clone())
//!         .with_output("propiedades.csv");
//!     let (table, _summary) = runner.run(&mut fetcher, &items).await?;
//!     println!("{} listings", table.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{
        BatchRunner, BatchSummary, DetailScraper, ItemScraper, ListingPageScraper, PoliteFetcher,
        PropertyType, Region, WorkItem,
    };
    pub use crate::error::{Error, ErrorCategory, PortalErrorTrait, Result};
    pub use crate::models::{FieldValue, Record, RecordTable};
    pub use crate::validation::{ValidationReport, Validator};
}

// Direct re-exports for convenience
pub use models::{FieldValue, Record, RecordTable};
