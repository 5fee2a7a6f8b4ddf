//! Results-page scraper with pagination
//!
//! Each work item is one results page. A page that fails to download or
//! parse contributes no rows, so a resumed run will try it again.

use async_trait::async_trait;

use crate::crawler::batch::{ItemScraper, WorkItem};
use crate::crawler::fetcher::PoliteFetcher;
use crate::crawler::url::page_urls;
use crate::error::Result;
use crate::models::{Record, PAGE_COLUMN};
use crate::parser::{ListingExtractor, LISTING_COLUMNS};
use crate::utils::error::ExtractError;

/// Scrapes listing cards from results pages
#[derive(Debug, Clone, Default)]
pub struct ListingPageScraper {
    extractor: ListingExtractor,
}

impl ListingPageScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Work items for pages `1..=pages` of `base_url`
    pub fn page_items(base_url: &str, pages: u32) -> Vec<WorkItem> {
        page_urls(base_url, pages)
            .into_iter()
            .map(WorkItem::for_url)
            .collect()
    }
}

#[async_trait]
impl ItemScraper for ListingPageScraper {
    fn columns(&self) -> Vec<String> {
        LISTING_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn resume_column(&self) -> &str {
        PAGE_COLUMN
    }

    fn placeholder_on_failure(&self) -> bool {
        false
    }

    async fn scrape(&self, fetcher: &mut PoliteFetcher, item: &WorkItem) -> Result<Vec<Record>> {
        let html = fetcher.fetch_text(&item.url).await?;

        match self.extractor.extract(&html, &item.url) {
            Ok(records) => {
                tracing::info!(page = %item.url, extracted = records.len(), "Page scraped");
                Ok(records)
            }
            Err(ExtractError::NoListings) => {
                tracing::info!(page = %item.url, "No listings on page");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}
