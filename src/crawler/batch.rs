//! Resumable batch runner
//!
//! Work items are processed strictly in order through an [`ItemScraper`].
//! The accumulated table is flushed to the output file every
//! `checkpoint_every` items and at the end, and a later run over the same
//! output skips items whose key is already present.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::BatchConfig;
use crate::crawler::fetcher::PoliteFetcher;
use crate::error::{PortalErrorTrait, Result};
use crate::models::{FieldValue, Record, RecordTable};
use crate::storage::checkpoint::CheckpointFile;

/// One unit of work: a URL plus the values stamped on its records
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// Resume identity
    pub key: String,
    pub url: String,
    /// Column values added to every record produced by this item
    pub tags: Vec<(String, FieldValue)>,
}

impl WorkItem {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            tags: Vec::new(),
        }
    }

    /// Item keyed by its own URL
    pub fn for_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(url.clone(), url)
    }

    #[must_use]
    pub fn with_tag(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.tags.push((column.to_string(), value.into()));
        self
    }

    fn stamp(&self, record: &mut Record) {
        for (column, value) in &self.tags {
            record.set(column, Some(value.clone()));
        }
    }
}

/// Fetch plus extraction for one work item
#[async_trait]
pub trait ItemScraper: Send + Sync {
    /// Output columns in order
    fn columns(&self) -> Vec<String>;

    /// Column holding each record's work-item key
    fn resume_column(&self) -> &str;

    /// Whether a failed item still produces a row carrying its key
    fn placeholder_on_failure(&self) -> bool {
        true
    }

    async fn scrape(&self, fetcher: &mut PoliteFetcher, item: &WorkItem) -> Result<Vec<Record>>;
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records: usize,
    pub checkpoints: usize,
    pub stopped_early: bool,
}

/// Drives an [`ItemScraper`] over a list of work items
pub struct BatchRunner<S> {
    scraper: S,
    config: BatchConfig,
    checkpoint: Option<CheckpointFile>,
}

impl<S: ItemScraper> BatchRunner<S> {
    pub fn new(scraper: S, config: BatchConfig) -> Self {
        Self {
            scraper,
            config,
            checkpoint: None,
        }
    }

    /// Persist to `path`, resuming from it when enabled
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(CheckpointFile::new(path, self.scraper.resume_column()));
        self
    }

    /// Process `items` in order and return the accumulated table
    ///
    /// # Errors
    ///
    /// Fails only when the previous output cannot be read or the final flush
    /// cannot be written. Item failures are logged and counted.
    pub async fn run(
        &self,
        fetcher: &mut PoliteFetcher,
        items: &[WorkItem],
    ) -> Result<(RecordTable, BatchSummary)> {
        let resume_column = self.scraper.resume_column().to_string();
        let mut table = RecordTable::with_columns(self.scraper.columns());
        let mut done: HashSet<String> = HashSet::new();
        let mut summary = BatchSummary::default();

        if let (Some(checkpoint), true) = (&self.checkpoint, self.config.resume) {
            if let Some(previous) = checkpoint.load()? {
                done = checkpoint.done_keys(&previous);
                table.append(previous);
            }
        }

        let pending = items.iter().filter(|i| !done.contains(&i.key)).count();
        tracing::info!(
            total = items.len(),
            pending,
            already_done = items.len() - pending,
            "Starting batch"
        );

        for item in items {
            if !done.insert(item.key.clone()) {
                summary.skipped += 1;
                tracing::debug!(key = %item.key, "Skipping processed item");
                continue;
            }

            let position = summary.processed + 1;
            tracing::info!(position, pending, url = %item.url, "Processing item");

            let mut empty = false;
            match self.scraper.scrape(fetcher, item).await {
                Ok(records) => {
                    empty = records.is_empty();
                    summary.records += records.len();
                    for mut record in records {
                        item.stamp(&mut record);
                        record.set_if_absent(&resume_column, item.key.as_str());
                        table.push(record);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        key = %item.key,
                        error = %e,
                        category = e.category().label(),
                        recoverable = e.is_recoverable(),
                        "Item failed"
                    );
                    if self.scraper.placeholder_on_failure() {
                        let mut placeholder = Record::new().with(&resume_column, item.key.as_str());
                        item.stamp(&mut placeholder);
                        table.push(placeholder);
                    }
                }
            }
            summary.processed += 1;

            if self.config.checkpoint_every > 0
                && summary.processed % self.config.checkpoint_every == 0
            {
                self.flush_periodic(&table, &mut summary);
            }

            if empty && self.config.stop_on_empty {
                tracing::info!(url = %item.url, "No records on page, stopping");
                summary.stopped_early = true;
                break;
            }
        }

        if let Some(checkpoint) = &self.checkpoint {
            checkpoint.save(&table)?;
            summary.checkpoints += 1;
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            records = summary.records,
            rows = table.len(),
            "Batch finished"
        );

        Ok((table, summary))
    }

    fn flush_periodic(&self, table: &RecordTable, summary: &mut BatchSummary) {
        let Some(checkpoint) = &self.checkpoint else {
            return;
        };
        match checkpoint.save(table) {
            Ok(()) => {
                summary.checkpoints += 1;
                tracing::info!(rows = table.len(), processed = summary.processed, "Checkpoint");
            }
            Err(e) => tracing::warn!(error = %e, "Checkpoint write failed, continuing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_tags() {
        let item = WorkItem::for_url("https://x/1")
            .with_tag("region_scraping", "Maule")
            .with_tag("pagina", 2u32);

        let mut record = Record::new().with("region_scraping", "otra");
        item.stamp(&mut record);

        assert_eq!(item.key, "https://x/1");
        assert_eq!(
            record.get_cell("region_scraping").as_deref(),
            Some("Maule")
        );
        assert_eq!(record.get_f64("pagina"), Some(2.0));
    }
}
