//! Post-hoc validation and cleaning of scraped tables
//!
//! The validator runs ordered, independent filter passes over a finished
//! output file. Each pass only removes rows and reports how many it removed.
//! Running the validator over its own output removes nothing.

use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};
use std::fmt;

use crate::config::{RangeRule, ValidationConfig};
use crate::models::RecordTable;
use crate::storage::dedup::{dedup_by, DedupPolicy};
use crate::utils::error::ValidationError;
use crate::utils::format_thousands;

pub const PRICE_COLUMN: &str = "precio";
pub const COMUNA_COLUMN: &str = "comuna";
pub const LOCATION_REGION_COLUMN: &str = "region";

/// Columns whose missing values are reported
pub const MISSING_REPORT_COLUMNS: &[&str] =
    &["dormitorios", "banos", "superficie_util", "estacionamientos"];

/// Rows removed by one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassOutcome {
    pub name: String,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceSummary {
    /// `None` for an empty sample
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let median = Data::new(values.to_vec()).median();
        Some(Self {
            mean: values.iter().mean(),
            median,
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub count: usize,
}

/// Summary of one validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub original_rows: usize,
    pub original_columns: usize,
    pub cleaned_rows: usize,
    pub passes: Vec<PassOutcome>,
    pub price: Option<PriceSummary>,
    pub unique_comunas: usize,
    pub unique_regions: Option<usize>,
    pub missing: Vec<MissingCount>,
}

impl ValidationReport {
    pub fn removed(&self) -> usize {
        self.original_rows - self.cleaned_rows
    }

    /// Share of rows removed, in percent
    pub fn removed_pct(&self) -> f64 {
        if self.original_rows == 0 {
            0.0
        } else {
            self.removed() as f64 / self.original_rows as f64 * 100.0
        }
    }

    /// Rows removed by the pass called `name`
    pub fn removed_by(&self, name: &str) -> Option<usize> {
        self.passes.iter().find(|p| p.name == name).map(|p| p.removed)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation report")?;
        writeln!(f, "=================")?;
        writeln!(
            f,
            "Original: {} rows, {} columns",
            self.original_rows, self.original_columns
        )?;
        writeln!(
            f,
            "Cleaned:  {} rows ({} removed, {:.1}%)",
            self.cleaned_rows,
            self.removed(),
            self.removed_pct()
        )?;

        writeln!(f, "\nPasses:")?;
        for pass in &self.passes {
            writeln!(f, "  - {}: {} removed", pass.name, pass.removed)?;
        }

        if let Some(price) = &self.price {
            writeln!(f, "\nPrices:")?;
            writeln!(f, "  - mean:   ${}", format_thousands(price.mean))?;
            writeln!(f, "  - median: ${}", format_thousands(price.median))?;
            writeln!(f, "  - min:    ${}", format_thousands(price.min))?;
            writeln!(f, "  - max:    ${}", format_thousands(price.max))?;
        }

        writeln!(f, "\nLocations:")?;
        writeln!(f, "  - unique comunas: {}", self.unique_comunas)?;
        if let Some(regions) = self.unique_regions {
            writeln!(f, "  - unique regions: {regions}")?;
        }

        if !self.missing.is_empty() {
            writeln!(f, "\nMissing values:")?;
            for m in &self.missing {
                let pct = if self.cleaned_rows == 0 {
                    0.0
                } else {
                    m.count as f64 / self.cleaned_rows as f64 * 100.0
                };
                writeln!(f, "  - {}: {} ({:.1}%)", m.column, m.count, pct)?;
            }
        }
        Ok(())
    }
}

/// Ordered filter passes over a finished table
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidRange` for an inverted range.
    pub fn new(config: ValidationConfig) -> Result<Self, ValidationError> {
        let price = RangeRule::new(PRICE_COLUMN, config.price_min, config.price_max);
        for rule in std::iter::once(&price).chain(config.ranges.iter()) {
            if rule.min > rule.max {
                return Err(ValidationError::InvalidRange {
                    column: rule.column.clone(),
                    min: rule.min,
                    max: rule.max,
                });
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Clean `table` and report what each pass removed
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingColumn` before any pass runs when the
    /// price or comuna column is absent.
    pub fn validate(
        &self,
        table: &RecordTable,
    ) -> Result<(RecordTable, ValidationReport), ValidationError> {
        for required in [PRICE_COLUMN, COMUNA_COLUMN] {
            if !table.has_column(required) {
                return Err(ValidationError::MissingColumn(required.to_string()));
            }
        }

        let mut cleaned = table.clone();
        let mut passes = Vec::new();
        let mut record = |name: &str, removed: usize| {
            tracing::info!(pass = name, removed, "Validation pass");
            passes.push(PassOutcome {
                name: name.to_string(),
                removed,
            });
        };

        let removed = cleaned.retain(|r| !r.is_null(PRICE_COLUMN));
        record("null_price", removed);

        let (min, max) = (self.config.price_min, self.config.price_max);
        let removed = cleaned.retain(|r| {
            r.get_f64(PRICE_COLUMN)
                .is_some_and(|p| p >= min && p <= max)
        });
        record("price_range", removed);

        let removed = cleaned.retain(|r| !r.is_null(COMUNA_COLUMN));
        record("null_comuna", removed);

        for rule in &self.config.ranges {
            if !cleaned.has_column(&rule.column) {
                continue;
            }
            let removed = cleaned.retain(|r| match r.get(&rule.column) {
                None => true,
                Some(value) => value.as_f64().map_or(true, |n| rule.contains(n)),
            });
            record(&format!("{}_range", rule.column), removed);
        }

        let key = self.dedup_key(&cleaned);
        let removed = dedup_by(&mut cleaned, &key, DedupPolicy::KeepFirst);
        record("duplicates", removed);

        let report = self.report(table, &cleaned, passes);
        Ok((cleaned, report))
    }

    /// First identifier column present, else the composite key
    fn dedup_key<'a>(&'a self, table: &RecordTable) -> Vec<&'a str> {
        match self
            .config
            .identifier_columns
            .iter()
            .find(|c| table.has_column(c))
        {
            Some(column) => vec![column.as_str()],
            None => self.config.composite_key.iter().map(String::as_str).collect(),
        }
    }

    fn report(
        &self,
        original: &RecordTable,
        cleaned: &RecordTable,
        passes: Vec<PassOutcome>,
    ) -> ValidationReport {
        let missing = MISSING_REPORT_COLUMNS
            .iter()
            .filter(|c| cleaned.has_column(c))
            .map(|c| MissingCount {
                column: c.to_string(),
                count: cleaned.null_count(c),
            })
            .collect();

        ValidationReport {
            original_rows: original.len(),
            original_columns: original.columns().len(),
            cleaned_rows: cleaned.len(),
            passes,
            price: PriceSummary::from_values(&cleaned.numbers(PRICE_COLUMN)),
            unique_comunas: cleaned.distinct(COMUNA_COLUMN).len(),
            unique_regions: cleaned
                .has_column(LOCATION_REGION_COLUMN)
                .then(|| cleaned.distinct(LOCATION_REGION_COLUMN).len()),
            missing,
        }
    }
}
