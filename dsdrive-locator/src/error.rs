//! Error types for locator parsing.

use thiserror::Error;

/// Errors that can occur when parsing a signed CDN attachment URL.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// The URL could not be parsed at all.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL path does not have the expected
    /// `/attachments/<channel_id>/<attachment_id>/<filename>` shape.
    #[error("invalid attachment path: {0}")]
    InvalidPath(String),

    /// A required query parameter (`ex`, `is`, or `hm`) was missing.
    #[error("missing query parameter: {0}")]
    MissingQueryParam(&'static str),

    /// A query parameter was present but not valid hex.
    #[error("invalid hex in query parameter {name}: {source}")]
    InvalidHex {
        name: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    /// A numeric path or query segment did not parse as the expected integer type.
    #[error("invalid integer in {field}: {source}")]
    InvalidInteger {
        field: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Result type for locator operations.
pub type Result<T> = std::result::Result<T, LocatorError>;
