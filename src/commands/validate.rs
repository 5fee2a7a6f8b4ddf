use anyhow::{Context, Result};
use std::path::PathBuf;

use portal_crawler::config::Config;
use portal_crawler::storage::{read_table, write_table};
use portal_crawler::utils::cleaned_path;
use portal_crawler::validation::Validator;

use super::banner;

/// Clean a finished output file into `<file>_limpio.csv`
///
/// A missing argument or a missing file is reported and is not an error.
pub fn validate(config: Config, file: Option<PathBuf>, json: bool) -> Result<()> {
    banner("DATA VALIDATOR");

    let Some(file) = file else {
        println!("\nError: a CSV file must be given");
        println!("\nUsage: portal-crawler validar <archivo.csv>");
        println!("Example: portal-crawler validar propiedades_20251010_120000.csv");
        return Ok(());
    };

    if !file.is_file() {
        println!("\nError: file '{}' does not exist", file.display());
        return Ok(());
    }

    println!("\nLoading: {}", file.display());
    let original = read_table(&file)?;
    println!("  Records loaded: {}", original.len());

    let validator = Validator::new(config.validation).context("Invalid validation rules")?;
    let (cleaned, report) = validator
        .validate(&original)
        .with_context(|| format!("Cannot validate {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{report}");
    }

    let output = cleaned_path(&file);
    write_table(&output, &cleaned)?;
    println!("Cleaned file saved: {}", output.display());
    Ok(())
}
