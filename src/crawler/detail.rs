//! Per-listing detail scraper

use async_trait::async_trait;

use crate::crawler::batch::{ItemScraper, WorkItem};
use crate::crawler::fetcher::PoliteFetcher;
use crate::error::Result;
use crate::models::{Record, RecordTable, LINK_COLUMN, URL_COLUMN};
use crate::parser::{DetailExtractor, DETAIL_COLUMNS};

/// Scrapes the characteristics table of each listing
#[derive(Debug, Clone, Default)]
pub struct DetailScraper {
    extractor: DetailExtractor,
}

impl DetailScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Work items from a listing table's `link` column, falling back to `url`
    ///
    /// Blank links are skipped.
    pub fn items_from_table(table: &RecordTable) -> Vec<WorkItem> {
        let column = if table.has_column(LINK_COLUMN) {
            LINK_COLUMN
        } else {
            URL_COLUMN
        };

        table
            .rows()
            .iter()
            .filter_map(|row| row.get_cell(column))
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty())
            .map(WorkItem::for_url)
            .collect()
    }
}

#[async_trait]
impl ItemScraper for DetailScraper {
    fn columns(&self) -> Vec<String> {
        DETAIL_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn resume_column(&self) -> &str {
        LINK_COLUMN
    }

    async fn scrape(&self, fetcher: &mut PoliteFetcher, item: &WorkItem) -> Result<Vec<Record>> {
        let html = fetcher.fetch_text(&item.url).await?;
        let mut record = self.extractor.extract(&html)?;
        record.set(LINK_COLUMN, Some(item.key.as_str().into()));
        Ok(vec![record])
    }
}
