//! Record deduplication and incremental merges
//!
//! Two policies coexist: incremental history merges keep the most recent
//! sighting of a listing, validation keeps the first one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{FieldValue, Record, RecordTable};

/// Which duplicate survives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    KeepFirst,
    KeepLast,
}

/// Identity of a record over `columns`; nulls compare equal to each other
pub fn record_key(record: &Record, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| record.get_cell(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

/// Remove duplicates over `columns`, returning how many rows were dropped
///
/// Survivors keep their relative order.
pub fn dedup_by(table: &mut RecordTable, columns: &[&str], policy: DedupPolicy) -> usize {
    let rows = table.take_rows();
    let before = rows.len();
    let mut seen = HashSet::new();

    let kept: Vec<Record> = match policy {
        DedupPolicy::KeepFirst => rows
            .into_iter()
            .filter(|r| seen.insert(record_key(r, columns)))
            .collect(),
        DedupPolicy::KeepLast => {
            let mut kept: Vec<Record> = rows
                .into_iter()
                .rev()
                .filter(|r| seen.insert(record_key(r, columns)))
                .collect();
            kept.reverse();
            kept
        }
    };

    let removed = before - kept.len();
    table.replace_rows(kept);
    removed
}

/// Counts reported after an incremental merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub existing: usize,
    pub new: usize,
    pub duplicates_removed: usize,
    pub total: usize,
}

/// Merge a fresh scrape into the history table
///
/// Fresh rows are stamped with `scraped_at` in `date_column`, appended after
/// the history and deduplicated by `key_column` keeping the latest sighting.
pub fn merge_incremental(
    existing: RecordTable,
    mut fresh: RecordTable,
    key_column: &str,
    date_column: &str,
    scraped_at: &str,
) -> (RecordTable, MergeStats) {
    let existing_len = existing.len();
    let new_len = fresh.len();

    fresh.stamp(date_column, &FieldValue::from(scraped_at));

    let mut merged = existing;
    merged.append(fresh);
    let duplicates_removed = dedup_by(&mut merged, &[key_column], DedupPolicy::KeepLast);

    if duplicates_removed > 0 {
        tracing::info!(duplicates_removed, "Removed duplicate listings");
    }

    let stats = MergeStats {
        existing: existing_len,
        new: new_len,
        duplicates_removed,
        total: merged.len(),
    };
    (merged, stats)
}
