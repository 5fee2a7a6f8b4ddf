//! Parser integration tests using HTML fixture files
//!
//! - Results page with complete, discounted, unpriced and UF listings
//! - Detail page characteristics table

use portal_crawler::error::ExtractError;
use portal_crawler::parser::{DetailExtractor, ListingExtractor, DETAIL_COLUMNS, LISTING_COLUMNS};
use std::fs;

/// Test fixture paths
const FIXTURES_DIR: &str = "tests/fixtures/html";

const PAGE_URL: &str = "https://www.portalinmobiliario.com/arriendo/casa/santiago-metropolitana";

fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

// ============================================================================
// Listing Page Tests
// ============================================================================

#[test]
fn test_listing_page_drops_unpriced_cards() {
    let html = load_fixture("listing_page.html");
    let records = ListingExtractor::new().extract(&html, PAGE_URL).unwrap();

    assert_eq!(records.len(), 3);
    let titles: Vec<String> = records
        .iter()
        .filter_map(|r| r.get_cell("titulo"))
        .collect();
    assert_eq!(
        titles,
        vec![
            "Casa en arriendo en Ñuñoa",
            "Casa amplia en Maipú",
            "Casa en La Reina"
        ]
    );
}

#[test]
fn test_listing_full_card() {
    let html = load_fixture("listing_page.html");
    let records = ListingExtractor::new().extract(&html, PAGE_URL).unwrap();
    let r = &records[0];

    assert_eq!(r.get_f64("precio"), Some(1_250_000.0));
    assert_eq!(r.get_cell("precio_texto").as_deref(), Some("$1.250.000"));
    assert_eq!(r.get_cell("moneda").as_deref(), Some("$"));
    assert_eq!(r.get_cell("comuna").as_deref(), Some("Ñuñoa"));
    assert_eq!(r.get_cell("region").as_deref(), Some("RM (Metropolitana)"));
    assert_eq!(
        r.get_cell("ubicacion").as_deref(),
        Some("Av. Irarrázaval 3000, Ñuñoa, RM (Metropolitana)")
    );
    assert_eq!(r.get_f64("dormitorios"), Some(4.0));
    assert_eq!(r.get_f64("banos"), Some(3.0));
    assert_eq!(r.get_f64("superficie_util"), Some(180.0));
    assert_eq!(r.get_f64("superficie_total"), Some(320.0));
    assert_eq!(r.get_f64("estacionamientos"), Some(2.0));
    assert_eq!(r.get_cell("vendedor").as_deref(), Some("Corredora Andes"));
    assert_eq!(
        r.get_cell("url").as_deref(),
        Some("https://www.portalinmobiliario.com/MLC-1501234567-casa-en-nunoa-_JM")
    );
}

#[test]
fn test_listing_current_price_and_relative_link() {
    let html = load_fixture("listing_page.html");
    let records = ListingExtractor::new().extract(&html, PAGE_URL).unwrap();
    let r = &records[1];

    // The crossed-out previous price is ignored
    assert_eq!(r.get_f64("precio"), Some(650_000.0));
    assert_eq!(
        r.get_cell("url").as_deref(),
        Some("https://www.portalinmobiliario.com/MLC-1507654321-casa-en-maipu-_JM")
    );
    assert_eq!(r.get_f64("banos"), Some(1.0));
    // An unqualified area counts as usable area
    assert_eq!(r.get_f64("superficie_util"), Some(95.0));
    assert!(r.is_null("superficie_total"));
    assert!(r.is_null("vendedor"));
}

#[test]
fn test_listing_uf_price_and_default_region() {
    let html = load_fixture("listing_page.html");
    let records = ListingExtractor::new().extract(&html, PAGE_URL).unwrap();
    let r = &records[2];

    assert_eq!(r.get_f64("precio"), Some(45.0));
    assert_eq!(r.get_cell("moneda").as_deref(), Some("UF"));
    assert_eq!(r.get_cell("comuna").as_deref(), Some("La Reina"));
    assert_eq!(r.get_cell("region").as_deref(), Some("Región Metropolitana"));
}

#[test]
fn test_listing_fields_are_known_columns() {
    let html = load_fixture("listing_page.html");
    let records = ListingExtractor::new().extract(&html, PAGE_URL).unwrap();

    for record in &records {
        for name in record.field_names() {
            assert!(LISTING_COLUMNS.contains(&name), "unexpected column {name}");
        }
    }
}

#[test]
fn test_page_without_cards() {
    let html = "<html><body><div class=\"ui-search-rescue\">Sin resultados</div></body></html>";
    let result = ListingExtractor::new().extract(html, PAGE_URL);
    assert!(matches!(result, Err(ExtractError::NoListings)));
}

// ============================================================================
// Detail Page Tests
// ============================================================================

#[test]
fn test_detail_page_characteristics() {
    let html = load_fixture("detail_page.html");
    let record = DetailExtractor::new().extract(&html).unwrap();

    assert_eq!(record.get_f64("superficie_util"), Some(180.0));
    assert_eq!(record.get_f64("superficie_total"), Some(320.0));
    assert_eq!(record.get_f64("dormitorios"), Some(4.0));
    assert_eq!(record.get_f64("banos"), Some(3.0));

    for name in record.field_names() {
        assert!(DETAIL_COLUMNS.contains(&name), "unexpected column {name}");
    }
}

#[test]
fn test_detail_page_without_table() {
    let result = DetailExtractor::new().extract("<html><body><h1>Aviso pausado</h1></body></html>");
    assert!(matches!(result, Err(ExtractError::NoCharacteristics)));
}
