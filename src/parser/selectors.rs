//! CSS selectors for the portal's listing and detail pages
//!
//! Listing cards use the `poly-*` component classes; the detail page exposes
//! its characteristics as an `andes-table`.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Listing page
    pub static ref LISTING_ITEM: Selector = parse_selector!("li.ui-search-layout__item");
    pub static ref TITLE: Selector = parse_selector!(".poly-component__title");
    pub static ref ANY_LINK: Selector = parse_selector!("a[href]");

    /// Current price first, any amount as fallback
    pub static ref PRICE: Vec<Selector> = vec![
        parse_selector!(".poly-price__current .andes-money-amount__fraction"),
        parse_selector!(".andes-money-amount__fraction"),
    ];

    pub static ref CURRENCY: Vec<Selector> = vec![
        parse_selector!(".poly-price__current .andes-money-amount__currency-symbol"),
        parse_selector!(".andes-money-amount__currency-symbol"),
    ];

    pub static ref LOCATION: Selector = parse_selector!(".poly-component__location");
    pub static ref SELLER: Selector = parse_selector!(".poly-component__seller");
    pub static ref ATTRIBUTE: Selector = parse_selector!("li.poly-attributes_list__item");

    // Detail page
    pub static ref DETAIL_ROW: Selector = parse_selector!("tr.andes-table__row");
    pub static ref DETAIL_HEADER: Selector = parse_selector!("th");
    pub static ref DETAIL_CELL: Selector = parse_selector!("td");
    pub static ref DETAIL_VALUE: Selector = parse_selector!(".andes-table__column--value");
}
