//! Detail-page characteristics table

use scraper::Html;

use super::selectors::{DETAIL_CELL, DETAIL_HEADER, DETAIL_ROW, DETAIL_VALUE};
use super::text::{clean_text, first_number, parse_area};
use crate::models::{FieldValue, Record, LINK_COLUMN};
use crate::utils::error::ExtractError;

/// Detail columns in output order
pub const DETAIL_COLUMNS: &[&str] = &[
    LINK_COLUMN,
    "superficie_util",
    "superficie_total",
    "dormitorios",
    "banos",
];

/// Extracts area and room counts from a listing's detail page
#[derive(Debug, Clone, Default)]
pub struct DetailExtractor;

impl DetailExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read the characteristics table
    ///
    /// Values are stored as numbers when they parse, otherwise as the raw
    /// cell text.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::NoCharacteristics` when the page has no table rows.
    pub fn extract(&self, html: &str) -> Result<Record, ExtractError> {
        let document = Html::parse_document(html);
        let mut record = Record::new();
        let mut rows = 0usize;

        for row in document.select(&DETAIL_ROW) {
            rows += 1;
            let (Some(th), Some(td)) = (row.select(&DETAIL_HEADER).next(), row.select(&DETAIL_CELL).next()) else {
                continue;
            };

            let key = th.text().collect::<String>().trim().to_lowercase();
            let value_el = td.select(&DETAIL_VALUE).next().unwrap_or(td);
            let Some(value) = clean_text(&value_el.text().collect::<Vec<_>>().join(" ")) else {
                continue;
            };

            if key.contains("superficie útil") {
                record.set("superficie_util", Some(area_value(value)));
            } else if key.contains("superficie total") {
                record.set("superficie_total", Some(area_value(value)));
            } else if key.contains("dormitorios") {
                record.set("dormitorios", Some(count_value(value)));
            } else if key.contains("baños") {
                record.set("banos", Some(count_value(value)));
            }
        }

        if rows == 0 {
            return Err(ExtractError::NoCharacteristics);
        }
        Ok(record)
    }
}

fn area_value(text: String) -> FieldValue {
    match parse_area(&text) {
        Some(area) => FieldValue::Number(area),
        None => FieldValue::Text(text),
    }
}

fn count_value(text: String) -> FieldValue {
    match text.trim().parse::<u32>().ok().or_else(|| first_number(&text)) {
        Some(n) => FieldValue::from(n),
        None => FieldValue::Text(text),
    }
}
