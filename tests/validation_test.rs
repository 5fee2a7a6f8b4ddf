//! Validation and merge tests over CSV files on disk

use tempfile::TempDir;

use portal_crawler::config::ValidationConfig;
use portal_crawler::models::{Record, RecordTable, SCRAPE_DATE_COLUMN};
use portal_crawler::storage::dedup::merge_incremental;
use portal_crawler::storage::{read_table, write_table, UTF8_BOM};
use portal_crawler::utils::cleaned_path;
use portal_crawler::validation::Validator;

fn listing(url: &str, precio: Option<f64>, comuna: Option<&str>, dormitorios: Option<u32>) -> Record {
    let mut r = Record::new().with("url", url).with("titulo", "Casa");
    r.set("precio", precio.map(Into::into));
    r.set("comuna", comuna.map(Into::into));
    r.set("dormitorios", dormitorios.map(Into::into));
    r
}

fn scraped_table() -> RecordTable {
    let mut table = RecordTable::with_columns(["titulo", "precio", "comuna", "dormitorios", "url"]);
    table.push(listing("https://x/1", Some(450_000.0), Some("Ñuñoa"), Some(3)));
    table.push(listing("https://x/2", None, Some("Ñuñoa"), Some(2)));
    table.push(listing("https://x/3", Some(900.0), Some("Maipú"), Some(2)));
    table.push(listing("https://x/4", Some(600_000.0), None, Some(2)));
    table.push(listing("https://x/5", Some(700_000.0), Some("Maipú"), Some(0)));
    table.push(listing("https://x/6", Some(800_000.0), Some("Maipú"), None));
    table.push(listing("https://x/1", Some(470_000.0), Some("Ñuñoa"), Some(3)));
    table
}

#[test]
fn test_validate_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("propiedades_20251010_120000.csv");
    write_table(&input, &scraped_table()).unwrap();

    let validator = Validator::new(ValidationConfig::default()).unwrap();
    let original = read_table(&input).unwrap();
    let (cleaned, report) = validator.validate(&original).unwrap();

    assert_eq!(report.original_rows, 7);
    assert_eq!(report.removed_by("null_price"), Some(1));
    assert_eq!(report.removed_by("price_range"), Some(1));
    assert_eq!(report.removed_by("null_comuna"), Some(1));
    assert_eq!(report.removed_by("dormitorios_range"), Some(1));
    assert_eq!(report.removed_by("duplicates"), Some(1));
    assert_eq!(cleaned.len(), 2);
    // Keep first: the earlier price of the duplicated listing survives
    assert_eq!(cleaned.numbers("precio"), vec![450_000.0, 800_000.0]);

    let output = cleaned_path(&input);
    assert_eq!(
        output.file_name().unwrap().to_string_lossy(),
        "propiedades_20251010_120000_limpio.csv"
    );
    write_table(&output, &cleaned).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
}

#[test]
fn test_validation_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("datos_limpio.csv");
    let validator = Validator::new(ValidationConfig::default()).unwrap();

    let (cleaned, _) = validator.validate(&scraped_table()).unwrap();
    write_table(&first, &cleaned).unwrap();

    let reread = read_table(&first).unwrap();
    let (again, report) = validator.validate(&reread).unwrap();

    assert_eq!(report.removed(), 0);
    assert!(report.passes.iter().all(|p| p.removed == 0));
    assert_eq!(again.len(), cleaned.len());
}

#[test]
fn test_empty_input_reports_zero() {
    let table = RecordTable::with_columns(["precio", "comuna"]);
    let (cleaned, report) = Validator::new(ValidationConfig::default())
        .unwrap()
        .validate(&table)
        .unwrap();

    assert!(cleaned.is_empty());
    assert_eq!(report.removed_pct(), 0.0);
    assert!(report.price.is_none());
}

#[test]
fn test_report_serializes_to_json() {
    let (_, report) = Validator::new(ValidationConfig::default())
        .unwrap()
        .validate(&scraped_table())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["original_rows"], 7);
    assert_eq!(json["cleaned_rows"], 2);
    assert!(json["passes"].is_array());
}

#[test]
fn test_incremental_merge_keeps_last() {
    let dir = TempDir::new().unwrap();
    let history = dir.path().join("propiedades_historico.csv");

    let mut existing = RecordTable::with_columns(["url", "precio"]);
    existing.push(Record::new().with("url", "https://x/1").with("precio", 400_000.0));
    existing.push(Record::new().with("url", "https://x/2").with("precio", 500_000.0));
    write_table(&history, &existing).unwrap();

    let mut fresh = RecordTable::with_columns(["url", "precio"]);
    fresh.push(Record::new().with("url", "https://x/1").with("precio", 420_000.0));
    fresh.push(Record::new().with("url", "https://x/3").with("precio", 610_000.0));

    let (merged, stats) = merge_incremental(
        read_table(&history).unwrap(),
        fresh,
        "url",
        SCRAPE_DATE_COLUMN,
        "2025-10-10 12:00:00",
    );

    assert_eq!(stats.existing, 2);
    assert_eq!(stats.new, 2);
    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(stats.total, 3);
    assert_eq!(merged.numbers("precio"), vec![500_000.0, 420_000.0, 610_000.0]);

    // Rows from the history keep their (absent) scrape date
    assert_eq!(merged.null_count(SCRAPE_DATE_COLUMN), 1);

    write_table(&history, &merged).unwrap();
    let reread = read_table(&history).unwrap();
    assert_eq!(reread.columns(), &["url", "precio", SCRAPE_DATE_COLUMN]);
    assert_eq!(
        reread.rows()[1].get_cell(SCRAPE_DATE_COLUMN).as_deref(),
        Some("2025-10-10 12:00:00")
    );
}
