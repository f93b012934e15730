//! Error types for dsdrive-crypto operations.

use thiserror::Error;

/// Errors that can occur during chunk encryption/decryption.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ciphertext is shorter than a single cipher block, so no IV could be read.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort { expected: usize, actual: usize },

    /// PKCS#7 padding byte was zero or larger than the block size.
    #[error("invalid PKCS#7 padding")]
    InvalidPadding,

    /// The base64 envelope (`iv || ciphertext`) failed to decode.
    #[error("invalid base64 envelope: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
