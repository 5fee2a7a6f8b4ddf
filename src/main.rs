use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_crawler::config::Config;
use portal_crawler::crawler::{PropertyType, Region};
use portal_crawler::utils::prompt::{AutoConfirm, Confirm, StdinConfirm};
use portal_crawler::utils::retry::secs_to_duration;

mod commands;

use commands::{
    configurable, detail, incremental, regions, simple, validate, ConfigurableParams,
    DetailParams, IncrementalParams,
};

#[derive(Parser)]
#[command(
    name = "portal-crawler",
    version,
    about = "Polite, resumable rental listing crawler for portalinmobiliario.com",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Houses for rent in the metropolitan region, 5 pages
    Simple,

    /// Choose property type, region, pages and delay
    Configurable {
        /// Property type
        #[arg(long, value_enum, default_value_t = PropertyType::Casa)]
        tipo: PropertyType,

        /// Region
        #[arg(long, value_enum, default_value_t = Region::Metropolitana)]
        region: Region,

        /// Number of result pages
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
        paginas: u32,

        /// Seconds between requests
        #[arg(long, default_value = "3", value_parser = non_negative_secs)]
        delay: f64,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a fresh scrape into the history file
    Incremental {
        /// Number of result pages
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
        paginas: u32,

        /// Seconds between requests
        #[arg(long, default_value = "3", value_parser = non_negative_secs)]
        delay: f64,

        /// History CSV file
        #[arg(long, default_value = commands::incremental::DEFAULT_HISTORY_FILE)]
        historico: PathBuf,
    },

    /// Scrape several regions into one national file
    Regiones {
        /// Property type
        #[arg(long, value_enum, default_value_t = PropertyType::Casa)]
        tipo: PropertyType,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Scrape the characteristics table of every listing in a CSV
    Detalle {
        /// Listing CSV with a `link` (or `url`) column
        #[arg(short, long, default_value = commands::detail::DEFAULT_INPUT_FILE)]
        input: PathBuf,

        /// Output CSV, also used to resume
        #[arg(short, long, default_value = commands::detail::DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Flush to disk every K listings
        #[arg(long)]
        checkpoint_every: Option<usize>,

        /// Start over instead of skipping links already in the output
        #[arg(long)]
        no_resume: bool,
    },

    /// Clean a scraped CSV and print a quality report
    Validar {
        /// CSV file to validate
        archivo: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn non_negative_secs(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if secs >= 0.0 && secs_to_duration(secs).is_some() {
        Ok(secs)
    } else {
        Err(String::from("must be a non-negative number of seconds"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("portal-crawler starting");

    match cli.command {
        Commands::Simple => {
            tracing::info!("Starting simple command");
            simple(config).await?;
        }

        Commands::Configurable {
            tipo,
            region,
            paginas,
            delay,
            output,
        } => {
            tracing::info!(
                tipo = %tipo,
                region = %region,
                paginas = %paginas,
                delay = %delay,
                output = ?output,
                "Starting configurable command"
            );
            let params = ConfigurableParams {
                tipo,
                region,
                pages: paginas,
                delay,
                output,
            };
            configurable(config, params).await?;
        }

        Commands::Incremental {
            paginas,
            delay,
            historico,
        } => {
            tracing::info!(
                paginas = %paginas,
                delay = %delay,
                historico = %historico.display(),
                "Starting incremental command"
            );
            let params = IncrementalParams {
                pages: paginas,
                delay,
                history: historico,
            };
            incremental(config, params).await?;
        }

        Commands::Regiones { tipo, yes } => {
            tracing::info!(tipo = %tipo, yes = %yes, "Starting regiones command");
            let confirm: &dyn Confirm = if yes { &AutoConfirm } else { &StdinConfirm };
            regions(config, tipo, confirm).await?;
        }

        Commands::Detalle {
            input,
            output,
            checkpoint_every,
            no_resume,
        } => {
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                checkpoint_every = ?checkpoint_every,
                resume = !no_resume,
                "Starting detalle command"
            );
            let params = DetailParams {
                input,
                output,
                checkpoint_every,
                resume: !no_resume,
            };
            detail(config, params).await?;
        }

        Commands::Validar { archivo, json } => {
            tracing::info!(archivo = ?archivo, "Starting validar command");
            validate(config, archivo, json)?;
        }
    }

    tracing::info!("portal-crawler completed successfully");
    Ok(())
}

/// File (or defaults), then `PORTAL_*` overrides
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("portal_crawler=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("portal_crawler={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
