//! Tabular persistence for scraped records
//!
//! Output files are CSV encoded as UTF-8 with a leading byte-order mark so
//! spreadsheet tools detect the encoding. Empty cells read back as null.

pub mod checkpoint;
pub mod dedup;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::{FieldValue, Record, RecordTable};

/// UTF-8 byte-order mark written at the start of every output file
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a CSV table, tolerating a leading BOM
pub fn read_table(path: &Path) -> Result<RecordTable> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read table: {}", path.display()))?;
    parse_table(&bytes).with_context(|| format!("Failed to parse table: {}", path.display()))
}

/// Parse CSV bytes into a table
pub fn parse_table(bytes: &[u8]) -> Result<RecordTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Missing CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = RecordTable::with_columns(headers.iter().cloned());
    for row in reader.records() {
        let row = row.context("Malformed CSV row")?;
        let mut record = Record::new();
        for (column, cell) in headers.iter().zip(row.iter()) {
            record.set(column, FieldValue::from_cell(cell));
        }
        table.push(record);
    }

    Ok(table)
}

/// Serialize a table to CSV bytes with a BOM
pub fn table_to_bytes(table: &RecordTable) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer
            .write_record(table.columns())
            .context("Failed to write CSV header")?;
        for row in table.rows() {
            let cells = table
                .columns()
                .iter()
                .map(|column| row.get_cell(column).unwrap_or_default());
            writer.write_record(cells).context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV writer")?;
    }
    Ok(buffer)
}

/// Write a table to `path`, creating parent directories
pub fn write_table(path: &Path, table: &RecordTable) -> Result<()> {
    ensure_parent(path)?;
    let bytes = table_to_bytes(table)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write table: {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = table.len(), "Table written");
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RecordTable {
        let mut table = RecordTable::with_columns(["titulo", "precio", "comuna"]);
        table.push(
            Record::new()
                .with("titulo", "Casa, 3 dormitorios")
                .with("precio", 450_000.0)
                .with("comuna", "Ñuñoa"),
        );
        table.push(Record::new().with("titulo", "Depto").with("comuna", "Providencia"));
        table
    }

    #[test]
    fn test_output_starts_with_bom() {
        let bytes = table_to_bytes(&sample()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("titulo,precio,comuna\n"));
        assert!(text.contains("\"Casa, 3 dormitorios\",450000,Ñuñoa"));
        assert!(text.contains("Depto,,Providencia"));
    }

    #[test]
    fn test_write_then_read_preserves_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("tabla.csv");

        write_table(&path, &sample()).unwrap();
        let table = read_table(&path).unwrap();

        assert_eq!(table.columns(), &["titulo", "precio", "comuna"]);
        assert_eq!(table.len(), 2);
        assert!(table.rows()[1].is_null("precio"));
        assert_eq!(table.rows()[0].get_f64("precio"), Some(450_000.0));
        assert_eq!(
            table.rows()[0].get_cell("comuna").as_deref(),
            Some("Ñuñoa")
        );
    }

    #[test]
    fn test_parse_without_bom() {
        let table = parse_table(b"url,precio\nhttps://x/1,100\n").unwrap();
        assert_eq!(table.columns(), &["url", "precio"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(read_table(&dir.path().join("nope.csv")).is_err());
    }
}
