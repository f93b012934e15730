//! Error types for webhook upload/download and signed-URL renewal.

use thiserror::Error;

/// Errors that can occur while talking to the remote webhook/CDN service.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP request itself failed (connection refused, TLS error, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The request timed out.
    #[error("timeout")]
    Timeout,

    /// The service responded with a non-200, non-429 status to an upload.
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// A non-200, non-429 status from a GET request.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be parsed as the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// A locator in the response could not be parsed.
    #[error("malformed locator: {0}")]
    MalformedLocator(#[from] dsdrive_locator::error::LocatorError),

    /// The dispatcher was constructed with an empty endpoint list.
    #[error("no webhook endpoints configured")]
    NoEndpoints,

    /// A spawned renewal task panicked or was cancelled before completing.
    #[error("renewal task failed: {0}")]
    RenewalTaskFailed(String),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
