use anyhow::{Context, Result};
use std::path::PathBuf;

use portal_crawler::config::Config;
use portal_crawler::crawler::{BatchRunner, DetailScraper, PoliteFetcher};
use portal_crawler::storage::read_table;

use super::banner;

pub const DEFAULT_INPUT_FILE: &str = "propiedades_portal_inmobiliario.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "propiedades_detalle_caracteristicas.csv";

/// Arguments of the `detalle` subcommand
#[derive(Debug, Clone)]
pub struct DetailParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub checkpoint_every: Option<usize>,
    pub resume: bool,
}

pub async fn detail(config: Config, params: DetailParams) -> Result<()> {
    if !params.input.is_file() {
        anyhow::bail!("Input file not found: {}", params.input.display());
    }

    banner("PORTAL INMOBILIARIO - LISTING DETAILS");

    let listings = read_table(&params.input)?;
    let items = DetailScraper::items_from_table(&listings);

    let mut batch = config.batch.clone();
    batch.resume = params.resume;
    if let Some(every) = params.checkpoint_every {
        batch.checkpoint_every = every;
    }

    println!("  Input:            {} ({} links)", params.input.display(), items.len());
    println!("  Output:           {}", params.output.display());
    println!("  Checkpoint every: {}", batch.checkpoint_every);
    println!("  Resume:           {}", batch.resume);

    let mut fetcher = PoliteFetcher::from_config(&config).context("Failed to create HTTP client")?;
    let runner = BatchRunner::new(DetailScraper::new(), batch).with_output(&params.output);
    let (table, summary) = runner.run(&mut fetcher, &items).await?;

    banner("SUMMARY");
    println!("  Processed:    {}", summary.processed);
    println!("  Skipped:      {}", summary.skipped);
    println!("  Failed:       {}", summary.failed);
    println!("  Rows saved:   {}", table.len());
    println!("  Rate limited: {}", fetcher.rate_limited_total());
    println!("  Output:       {}", params.output.display());
    Ok(())
}
