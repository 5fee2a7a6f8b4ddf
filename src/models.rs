// Core data structures for the portal crawler

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Column holding a listing's permanent link in listing-page output
pub const URL_COLUMN: &str = "url";

/// Column holding a listing's permanent link in detail output
pub const LINK_COLUMN: &str = "link";

/// Column recording which results page a listing came from
pub const PAGE_COLUMN: &str = "pagina_url";

/// Column stamped on incremental merges
pub const SCRAPE_DATE_COLUMN: &str = "fecha_scraping";

/// Column stamped by the multi-region run
pub const REGION_COLUMN: &str = "region_scraping";

/// A single extracted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parse a CSV cell: empty is null, numeric text becomes a number
    pub fn from_cell(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Self::Number(n)),
            _ => Some(Self::Text(cell.to_string())),
        }
    }

    /// Numeric view; numeric-looking text is coerced
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => t.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Canonical string used for identity comparisons and CSV cells
    pub fn to_cell(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One listing: field name to optional value (absent means null)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a field
    pub fn set(&mut self, name: &str, value: Option<FieldValue>) {
        match value {
            Some(v) => {
                self.fields.insert(name.to_string(), v);
            }
            None => {
                self.fields.remove(name);
            }
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Set only when the field is currently null
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<FieldValue>) {
        if !self.fields.contains_key(name) {
            self.fields.insert(name.to_string(), value.into());
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    /// Cell text of a field, `None` when null
    pub fn get_cell(&self, name: &str) -> Option<String> {
        self.get(name).map(FieldValue::to_cell)
    }

    pub fn is_null(&self, name: &str) -> bool {
        !self.fields.contains_key(name)
    }

    /// Field names that carry a value
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered columns plus rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordTable {
    /// Empty table with a declared column order
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for column in columns {
            table.add_column(&column.into());
        }
        table
    }

    /// Append a column if it is not present yet
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Append a row; unseen field names become new trailing columns
    pub fn push(&mut self, record: Record) {
        let unseen: Vec<String> = record
            .field_names()
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect();
        for name in unseen {
            self.columns.push(name);
        }
        self.rows.push(record);
    }

    /// Append every row of `other`, keeping this table's column order first
    pub fn append(&mut self, other: RecordTable) {
        for column in &other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep rows matching `keep`, returning how many were removed
    pub fn retain<F: FnMut(&Record) -> bool>(&mut self, keep: F) -> usize {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }

    /// Move the rows out, leaving the columns
    pub fn take_rows(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.rows)
    }

    /// Replace the rows, keeping the columns
    pub fn replace_rows(&mut self, rows: Vec<Record>) {
        self.rows = rows;
    }

    /// Set a column on every row
    pub fn stamp(&mut self, column: &str, value: &FieldValue) {
        self.add_column(column);
        for row in &mut self.rows {
            row.set(column, Some(value.clone()));
        }
    }

    /// Distinct non-null cell values of a column
    pub fn distinct(&self, column: &str) -> HashSet<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get_cell(column))
            .collect()
    }

    /// Non-null numeric values of a column
    pub fn numbers(&self, column: &str) -> Vec<f64> {
        self.rows.iter().filter_map(|row| row.get_f64(column)).collect()
    }

    /// Number of null cells in a column
    pub fn null_count(&self, column: &str) -> usize {
        self.rows.iter().filter(|row| row.is_null(column)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_from_cell() {
        assert_eq!(FieldValue::from_cell(""), None);
        assert_eq!(FieldValue::from_cell("  "), None);
        assert_eq!(
            FieldValue::from_cell("350000"),
            Some(FieldValue::Number(350_000.0))
        );
        assert_eq!(
            FieldValue::from_cell("Providencia"),
            Some(FieldValue::Text("Providencia".to_string()))
        );
        assert_eq!(
            FieldValue::from_cell("NaN"),
            Some(FieldValue::Text("NaN".to_string()))
        );
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Number(350_000.0).to_string(), "350000");
        assert_eq!(FieldValue::Number(45.5).to_string(), "45.5");
        assert_eq!(FieldValue::from("UF").to_string(), "UF");
    }

    #[test]
    fn test_record_set_and_clear() {
        let mut record = Record::new().with("precio", 500_000.0);
        assert_eq!(record.get_f64("precio"), Some(500_000.0));

        record.set("precio", None);
        assert!(record.is_null("precio"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_set_if_absent() {
        let mut record = Record::new().with("link", "https://x/1");
        record.set_if_absent("link", "https://x/2");
        record.set_if_absent("pagina_url", "https://x/page");

        assert_eq!(record.get_cell("link").as_deref(), Some("https://x/1"));
        assert_eq!(
            record.get_cell("pagina_url").as_deref(),
            Some("https://x/page")
        );
    }

    #[test]
    fn test_table_columns_follow_schema_then_first_seen() {
        let mut table = RecordTable::with_columns(["titulo", "precio"]);
        table.push(Record::new().with("extra", "a").with("titulo", "Casa"));
        table.push(Record::new().with("otra", 1.0));

        assert_eq!(table.columns(), &["titulo", "precio", "extra", "otra"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_retain_counts_removed() {
        let mut table = RecordTable::default();
        table.push(Record::new().with("precio", 1.0));
        table.push(Record::new());
        table.push(Record::new().with("precio", 3.0));

        let removed = table.retain(|r| !r.is_null("precio"));
        assert_eq!(removed, 1);
        assert_eq!(table.numbers("precio"), vec![1.0, 3.0]);
    }

    #[test]
    fn test_table_stamp_and_distinct() {
        let mut table = RecordTable::default();
        table.push(Record::new().with("comuna", "Ñuñoa"));
        table.push(Record::new().with("comuna", "Ñuñoa"));
        table.push(Record::new());
        table.stamp("fecha_scraping", &FieldValue::from("2025-10-10 12:00:00"));

        assert_eq!(table.distinct("comuna").len(), 1);
        assert_eq!(table.null_count("comuna"), 1);
        assert_eq!(table.null_count("fecha_scraping"), 0);
    }
}
