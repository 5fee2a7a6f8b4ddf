//! Raw text to numbers
//!
//! The portal formats prices with `.` thousands separators and areas as
//! `85,5 m²`. These helpers never fail; unparseable text becomes `None`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::normalize_whitespace;

/// Region assumed when a location carries no region part
pub const DEFAULT_REGION: &str = "Región Metropolitana";

lazy_static! {
    static ref AREA: Regex = Regex::new(r"([\d.,]+)\s*m[²2]").expect("valid area regex");
    static ref INTEGER: Regex = Regex::new(r"\d+").expect("valid integer regex");
}

/// Keep only the digits of a price text
///
/// ```
/// use portal_crawler::parser::text::parse_price;
///
/// assert_eq!(parse_price("$ 1.250.000"), Some(1_250_000.0));
/// assert_eq!(parse_price("Consultar"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Area in square meters from text such as `"120 m² útiles"` or `"85,5 m2"`
pub fn parse_area(text: &str) -> Option<f64> {
    let captures = AREA.captures(text)?;
    let cleaned = captures[1].replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First run of digits in `text`
pub fn first_number(text: &str) -> Option<u32> {
    INTEGER.find(text)?.as_str().parse().ok()
}

/// Split a location into (comuna, region)
///
/// With two or more comma-separated parts the last two are used. A single
/// part is taken as the comuna of the metropolitan region.
pub fn split_location(text: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        let comuna = parts[parts.len() - 2];
        let region = parts[parts.len() - 1];
        (non_empty(comuna), non_empty(region))
    } else {
        (non_empty(text.trim()), Some(DEFAULT_REGION.to_string()))
    }
}

/// Trimmed, whitespace-collapsed element text; `None` when empty
pub fn clean_text(text: &str) -> Option<String> {
    non_empty(&normalize_whitespace(text))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
