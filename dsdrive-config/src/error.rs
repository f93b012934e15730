//! Error types for the dsdrive-config crate.

use thiserror::Error;

/// Result type for config and key-file operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("key file decryption failed: {0}")]
    Crypto(#[from] dsdrive_crypto::CryptoError),

    #[error("key file failed validation (wrong passphrase or corrupt file)")]
    InvalidValidator,

    #[error("decrypted key has the wrong length: expected 32 bytes, got {0}")]
    WrongKeyLength(usize),
}
