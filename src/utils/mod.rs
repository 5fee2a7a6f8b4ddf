//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod prompt;
pub mod retry;

use chrono::Local;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Timestamp format embedded in output filenames
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp format of the `fecha_scraping` column
pub const SCRAPE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Sanitize filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re =
        INVALID_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Invalid regex pattern"));

    re.replace_all(filename, "_").to_string()
}

/// Current local time formatted for filenames (`YYYYMMDD_HHMMSS`)
pub fn file_timestamp() -> String {
    Local::now().format(FILE_TIMESTAMP_FORMAT).to_string()
}

/// Current local time formatted for the `fecha_scraping` column
pub fn scrape_timestamp() -> String {
    Local::now().format(SCRAPE_DATE_FORMAT).to_string()
}

/// Build `{prefix}_{timestamp}.csv`
pub fn timestamped_filename(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.csv", sanitize_filename(prefix), file_timestamp()))
}

/// Path of the cleaned output for a validated file: `x.csv` -> `x_limpio.csv`
pub fn cleaned_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("datos"));

    input.with_file_name(format!("{stem}_limpio.csv"))
}

/// Round and group digits with commas: `1234567.4` -> `1,234,567`
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
