use anyhow::Result;
use std::path::{Path, PathBuf};

use portal_crawler::config::Config;
use portal_crawler::crawler::url::{listing_url, PORTAL_ORIGIN};
use portal_crawler::crawler::{BatchRunner, ListingPageScraper, PropertyType, Region};
use portal_crawler::models::{RecordTable, SCRAPE_DATE_COLUMN, URL_COLUMN};
use portal_crawler::storage::dedup::merge_incremental;
use portal_crawler::storage::{read_table, write_table};
use portal_crawler::utils::retry::secs_to_duration;
use portal_crawler::utils::{scrape_timestamp, timestamped_filename};

use super::{banner, listing_fetcher, money, price_range};

pub const DEFAULT_HISTORY_FILE: &str = "propiedades_historico.csv";

/// Arguments of the `incremental` subcommand
#[derive(Debug, Clone)]
pub struct IncrementalParams {
    pub pages: u32,
    pub delay: f64,
    pub history: PathBuf,
}

pub async fn incremental(config: Config, params: IncrementalParams) -> Result<()> {
    if params.pages == 0 {
        anyhow::bail!("--paginas must be greater than 0");
    }
    if params.delay < 0.0 || secs_to_duration(params.delay).is_none() {
        anyhow::bail!("--delay must be a non-negative number of seconds");
    }

    banner("PORTAL INMOBILIARIO - INCREMENTAL UPDATE");

    let base = listing_url(
        PORTAL_ORIGIN,
        PropertyType::Casa,
        Region::Metropolitana.slug(),
    );
    println!("  URL:     {base}");
    println!("  Pages:   {}", params.pages);
    println!("  History: {}", params.history.display());

    let existing = load_history(&params.history)?;

    // In-memory run: the history file is merged and written below
    let mut fetcher = listing_fetcher(&config, Some(params.delay))?;
    let items = ListingPageScraper::page_items(&base, params.pages);
    let runner = BatchRunner::new(ListingPageScraper::new(), config.batch.clone());
    let (fresh, summary) = runner.run(&mut fetcher, &items).await?;

    if fresh.is_empty() {
        println!("\nNo new listings extracted");
        return Ok(());
    }

    let (merged, stats) = merge_incremental(
        existing,
        fresh,
        URL_COLUMN,
        SCRAPE_DATE_COLUMN,
        &scrape_timestamp(),
    );

    write_table(&params.history, &merged)?;
    let backup = backup_path(&params.history);
    write_table(&backup, &merged)?;

    tracing::info!(
        existing = stats.existing,
        new = stats.new,
        duplicates = stats.duplicates_removed,
        total = stats.total,
        pages_failed = summary.failed,
        "History updated"
    );

    banner("SUMMARY");
    println!("  Previous records:   {}", stats.existing);
    println!("  New records:        {}", stats.new);
    println!("  Duplicates removed: {}", stats.duplicates_removed);
    println!("  Total in history:   {}", stats.total);
    println!("  History file:       {}", params.history.display());
    println!("  Backup:             {}", backup.display());

    print_history_stats(&merged);
    Ok(())
}

/// Previous history, or an empty table when the file does not exist yet
fn load_history(path: &Path) -> Result<RecordTable> {
    if !path.is_file() {
        println!("\nHistory file not found, a new one will be created");
        return Ok(RecordTable::default());
    }

    let table = read_table(path)?;
    println!("\nLoaded history: {} ({} records)", path.display(), table.len());
    Ok(table)
}

/// `backup_propiedades_{ts}.csv` next to the history file
fn backup_path(history: &Path) -> PathBuf {
    let name = timestamped_filename("backup_propiedades");
    match history.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => name,
    }
}

fn print_history_stats(table: &RecordTable) {
    println!("\nHistory statistics:");
    let prices = table.numbers("precio");
    if !prices.is_empty() {
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        println!("  Mean price:     {}", money(mean));
    }
    if let Some((min, max)) = price_range(table) {
        println!("  Min price:      {}", money(min));
        println!("  Max price:      {}", money(max));
    }
    println!("  Unique comunas: {}", table.distinct("comuna").len());
}
