//! HTML field extraction for the rental portal
//!
//! Extraction is selector lookups plus regex cleanup of price and area text.
//! Missing elements become null fields; they never abort a batch.

pub mod detail;
pub mod listing;
pub mod selectors;
pub mod text;

pub use detail::{DetailExtractor, DETAIL_COLUMNS};
pub use listing::{ListingExtractor, LISTING_COLUMNS};
