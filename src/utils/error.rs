//! Error types for the portal crawler
//!
//! This module defines the domain error types used throughout the crate.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error that survived the transport's own retries
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status surfaced by `FetchResponse::error_for_status`
    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// The server kept answering 429 beyond the configured budget
    #[error("Retry budget exhausted after {attempts} attempts (last status {last_status})")]
    RetryBudgetExhausted { attempts: u32, last_status: u16 },

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl FetchError {
    /// Whether retrying the same request later could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout | Self::RetryBudgetExhausted { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) | Self::InvalidHeader(_) => false,
        }
    }
}

/// Errors that can occur while extracting fields from a document
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The page has no listing container at all
    #[error("No listings found in document")]
    NoListings,

    /// The detail page has no characteristics table
    #[error("Characteristics table not found")]
    NoCharacteristics,
}

/// Errors raised by the validation pass
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A column required by a pass is not present in the input
    #[error("Required column missing: {0}")]
    MissingColumn(String),

    /// A configured range is inverted
    #[error("Invalid range for {column}: {min} > {max}")]
    InvalidRange { column: String, min: f64, max: f64 },
}
