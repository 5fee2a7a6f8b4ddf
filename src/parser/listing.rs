//! Listing-page extraction
//!
//! A results page holds up to 48 listing cards. Each card becomes one record;
//! cards without both a title and a price are dropped.

use scraper::{ElementRef, Html};
use url::Url;

use super::selectors::{
    ANY_LINK, ATTRIBUTE, CURRENCY, LISTING_ITEM, LOCATION, PRICE, SELLER, TITLE,
};
use super::text::{clean_text, first_number, parse_area, parse_price, split_location};
use crate::models::{Record, PAGE_COLUMN, URL_COLUMN};
use crate::utils::error::ExtractError;

/// Listing columns in output order
pub const LISTING_COLUMNS: &[&str] = &[
    "titulo",
    "precio",
    "precio_texto",
    "moneda",
    "ubicacion",
    "comuna",
    "region",
    "dormitorios",
    "banos",
    "superficie_total",
    "superficie_util",
    "estacionamientos",
    URL_COLUMN,
    "vendedor",
    PAGE_COLUMN,
];

/// Extracts listing records from results pages
#[derive(Debug, Clone, Default)]
pub struct ListingExtractor;

impl ListingExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every complete listing of a results page
    ///
    /// Relative links are resolved against `page_url`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::NoListings` when the page has no listing cards
    /// at all, which marks the end of pagination.
    pub fn extract(&self, html: &str, page_url: &str) -> Result<Vec<Record>, ExtractError> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let cards: Vec<ElementRef> = document.select(&LISTING_ITEM).collect();
        if cards.is_empty() {
            return Err(ExtractError::NoListings);
        }

        let records: Vec<Record> = cards
            .iter()
            .filter_map(|card| self.extract_card(*card, base.as_ref()))
            .collect();

        tracing::debug!(
            page = %page_url,
            found = cards.len(),
            kept = records.len(),
            "Extracted listings"
        );
        Ok(records)
    }

    /// One card to a record; `None` unless both title and price are present
    pub fn extract_card(&self, card: ElementRef, base: Option<&Url>) -> Option<Record> {
        let mut record = Record::new();

        if let Some(title) = card.select(&TITLE).next() {
            record.set("titulo", clean_text(&element_text(title)).map(Into::into));
            let href = title_href(title).or_else(|| {
                card.select(&ANY_LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
            });
            if let Some(href) = href {
                record.set(URL_COLUMN, Some(resolve(href, base).into()));
            }
        }

        if let Some(price) = first_match(card, &PRICE) {
            let text = element_text(price);
            record.set("precio", parse_price(&text).map(Into::into));
            record.set("precio_texto", clean_text(&text).map(|t| format!("${t}").into()));
        }
        if let Some(currency) = first_match(card, &CURRENCY) {
            record.set("moneda", clean_text(&element_text(currency)).map(Into::into));
        }

        if let Some(location) = card.select(&LOCATION).next() {
            if let Some(text) = clean_text(&element_text(location)) {
                let (comuna, region) = split_location(&text);
                record.set("comuna", comuna.map(Into::into));
                record.set("region", region.map(Into::into));
                record.set("ubicacion", Some(text.into()));
            }
        }

        if let Some(seller) = card.select(&SELLER).next() {
            let text = element_text(seller).replace("Por ", "");
            record.set("vendedor", clean_text(&text).map(Into::into));
        }

        for attribute in card.select(&ATTRIBUTE) {
            apply_attribute(&mut record, &element_text(attribute).to_lowercase());
        }

        if record.is_null("titulo") || record.is_null("precio") {
            return None;
        }
        Some(record)
    }
}

/// Route one attribute text (already lowercased) to its column
pub fn apply_attribute(record: &mut Record, text: &str) {
    if text.contains("dorm") || text.contains("habitac") {
        record.set("dormitorios", first_number(text).map(Into::into));
    } else if text.contains("baño") {
        record.set("banos", first_number(text).map(Into::into));
    } else if text.contains("m²") || text.contains("m2") {
        let area = parse_area(text);
        if text.contains("total") {
            record.set("superficie_total", area.map(Into::into));
        } else if text.contains("útil") || text.contains("util") {
            record.set("superficie_util", area.map(Into::into));
        } else if record.is_null("superficie_util") {
            record.set("superficie_util", area.map(Into::into));
        }
    } else if text.contains("estacionamiento") {
        record.set("estacionamientos", first_number(text).map(Into::into));
    }
}

fn title_href<'a>(title: ElementRef<'a>) -> Option<&'a str> {
    if let Some(href) = title.value().attr("href") {
        return Some(href);
    }
    title
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}

fn first_match<'a>(card: ElementRef<'a>, selectors: &[scraper::Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| card.select(s).next())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn resolve(href: &str, base: Option<&Url>) -> String {
    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}
