//! Error types for the dsdrive-engine crate.

use thiserror::Error;

/// Result type for engine and file-handle operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] dsdrive_catalog::CatalogError),

    #[error("transport error: {0}")]
    Transport(#[from] dsdrive_transport::TransportError),

    #[error("crypto error: {0}")]
    Crypto(#[from] dsdrive_crypto::CryptoError),

    #[error("locator error: {0}")]
    Locator(#[from] dsdrive_locator::LocatorError),

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("no node at the requested path")]
    NotFound,

    #[error("node is the wrong kind for this operation")]
    WrongKind,

    #[error("path resolves to an empty segment list")]
    InvalidPath,

    #[error("target already exists")]
    AlreadyExists,

    #[error("handle is not open for reading")]
    NotReadable,

    #[error("handle is not open for writing")]
    NotWritable,

    #[error("seek before the start of the buffer")]
    InvalidSeek,

    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}
