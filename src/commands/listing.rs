use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use portal_crawler::config::Config;
use portal_crawler::crawler::url::{listing_url, page_urls, PORTAL_ORIGIN};
use portal_crawler::crawler::{
    default_region_plan, BatchRunner, ListingPageScraper, PropertyType, Region, RegionPlan,
    WorkItem,
};
use portal_crawler::models::{FieldValue, RecordTable, REGION_COLUMN, SCRAPE_DATE_COLUMN};
use portal_crawler::storage::write_table;
use portal_crawler::utils::prompt::Confirm;
use portal_crawler::utils::retry::secs_to_duration;
use portal_crawler::utils::{file_timestamp, scrape_timestamp, timestamped_filename};

use super::{banner, listing_fetcher, money, price_range};

/// Pages and delay of the fixed runs
const SIMPLE_PAGES: u32 = 5;
const SIMPLE_DELAY_SECS: f64 = 3.0;
const REGION_DELAY_SECS: f64 = 3.0;

pub async fn simple(config: Config) -> Result<()> {
    banner("PORTAL INMOBILIARIO - SIMPLE RUN");

    let base = listing_url(
        PORTAL_ORIGIN,
        PropertyType::Casa,
        Region::Metropolitana.slug(),
    );
    println!("  URL:    {base}");
    println!("  Pages:  {SIMPLE_PAGES}");
    println!("  Delay:  {SIMPLE_DELAY_SECS}s between pages");

    let output = timestamped_filename("propiedades");
    let table = scrape_pages(&config, &base, SIMPLE_PAGES, SIMPLE_DELAY_SECS, &output).await?;
    print_summary(&table, &output);
    Ok(())
}

/// Arguments of the `configurable` subcommand
#[derive(Debug, Clone)]
pub struct ConfigurableParams {
    pub tipo: PropertyType,
    pub region: Region,
    pub pages: u32,
    pub delay: f64,
    pub output: Option<PathBuf>,
}

pub async fn configurable(config: Config, params: ConfigurableParams) -> Result<()> {
    if params.pages == 0 {
        anyhow::bail!("--paginas must be greater than 0");
    }
    if params.delay < 0.0 || secs_to_duration(params.delay).is_none() {
        anyhow::bail!("--delay must be a non-negative number of seconds");
    }

    banner("PORTAL INMOBILIARIO - CONFIGURABLE RUN");

    let base = listing_url(PORTAL_ORIGIN, params.tipo, params.region.slug());
    println!("  Type:   {}", params.tipo);
    println!("  Region: {}", params.region.display_name());
    println!("  Pages:  {}", params.pages);
    println!("  Delay:  {}s", params.delay);

    let output = params.output.unwrap_or_else(|| {
        timestamped_filename(&format!("propiedades_{}_{}", params.tipo, params.region))
    });
    let table = scrape_pages(&config, &base, params.pages, params.delay, &output).await?;
    print_summary(&table, &output);
    Ok(())
}

/// National run over the default region plan
pub async fn regions(config: Config, tipo: PropertyType, confirm: &dyn Confirm) -> Result<()> {
    banner("PORTAL INMOBILIARIO - MULTI-REGION RUN");

    let plan = default_region_plan();
    println!("\nRegions:");
    for (i, region) in plan.iter().enumerate() {
        println!("  {}. {} ({} pages)", i + 1, region.name, region.pages);
    }
    let total_pages: u32 = plan.iter().map(|r| r.pages).sum();
    println!(
        "\nEstimated time: ~{} seconds",
        f64::from(total_pages) * REGION_DELAY_SECS
    );

    if !confirm
        .confirm("\n¿Continuar?")
        .context("Failed to read confirmation")?
    {
        println!("Cancelled");
        return Ok(());
    }

    let items = region_items(tipo, &plan);
    let output = PathBuf::from(format!("propiedades_nacional_{}.csv", file_timestamp()));

    let mut fetcher = listing_fetcher(&config, Some(REGION_DELAY_SECS))?;
    let runner = BatchRunner::new(ListingPageScraper::new(), config.batch.clone())
        .with_output(&output);
    let (mut table, summary) = runner.run(&mut fetcher, &items).await?;

    if table.is_empty() {
        println!("\nNo listings extracted from any region");
        return Ok(());
    }

    table.stamp(SCRAPE_DATE_COLUMN, &FieldValue::from(scrape_timestamp()));
    write_table(&output, &table)?;

    println!("\nSummary by region:");
    println!(
        "  {:<24} {:>6} {:>14} {:>14} {:>14} {:>8}",
        "region", "count", "mean", "min", "max", "comunas"
    );
    for (name, stats) in region_stats(&table) {
        println!(
            "  {:<24} {:>6} {:>14} {:>14} {:>14} {:>8}",
            name,
            stats.count,
            money(stats.mean()),
            money(stats.min),
            money(stats.max),
            stats.comunas.len()
        );
    }

    banner("OVERALL SUMMARY");
    println!("  Listings:        {}", table.len());
    println!("  Pages failed:    {}", summary.failed);
    println!("  Regions:         {}", table.distinct(REGION_COLUMN).len());
    println!("  Unique comunas:  {}", table.distinct("comuna").len());
    println!("  Output:          {}", output.display());
    Ok(())
}

/// Page work items for every region, tagged with the region name
fn region_items(tipo: PropertyType, plan: &[RegionPlan]) -> Vec<WorkItem> {
    plan.iter()
        .flat_map(|region| {
            let base = listing_url(PORTAL_ORIGIN, tipo, &region.slug);
            page_urls(&base, region.pages)
                .into_iter()
                .map(move |url| WorkItem::for_url(url).with_tag(REGION_COLUMN, region.name.as_str()))
        })
        .collect()
}

#[derive(Debug, Default)]
struct RegionStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    comunas: HashSet<String>,
}

impl RegionStats {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

fn region_stats(table: &RecordTable) -> BTreeMap<String, RegionStats> {
    let mut stats: BTreeMap<String, RegionStats> = BTreeMap::new();
    for row in table.rows() {
        let Some(region) = row.get_cell(REGION_COLUMN) else {
            continue;
        };
        let entry = stats.entry(region).or_default();
        if let Some(comuna) = row.get_cell("comuna") {
            entry.comunas.insert(comuna);
        }
        if let Some(price) = row.get_f64("precio") {
            if entry.count == 0 {
                entry.min = price;
                entry.max = price;
            } else {
                entry.min = entry.min.min(price);
                entry.max = entry.max.max(price);
            }
            entry.count += 1;
            entry.sum += price;
        }
    }
    stats
}

async fn scrape_pages(
    config: &Config,
    base: &str,
    pages: u32,
    delay: f64,
    output: &Path,
) -> Result<RecordTable> {
    let mut fetcher = listing_fetcher(config, Some(delay))?;
    let items = ListingPageScraper::page_items(base, pages);
    let runner =
        BatchRunner::new(ListingPageScraper::new(), config.batch.clone()).with_output(output);
    let (table, summary) = runner.run(&mut fetcher, &items).await?;

    tracing::info!(
        pages = summary.processed,
        failed = summary.failed,
        listings = table.len(),
        rate_limited = fetcher.rate_limited_total(),
        "Listing run finished"
    );
    Ok(table)
}

fn print_summary(table: &RecordTable, output: &Path) {
    if table.is_empty() {
        println!("\nNo listings extracted");
        return;
    }

    banner("SUMMARY");
    println!("  Listings:       {}", table.len());
    println!("  Output:         {}", output.display());
    println!("  Columns:        {}", table.columns().len());
    if let Some((min, max)) = price_range(table) {
        println!("  Price range:    {} - {}", money(min), money(max));
    }
    println!("  Unique comunas: {}", table.distinct("comuna").len());
}
