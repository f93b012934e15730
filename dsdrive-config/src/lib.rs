//! Configuration loading and passphrase-key provisioning: the ambient
//! surface the out-of-scope SFTP front-end and CLIs would consume.

pub mod config;
pub mod error;
pub mod keyfile;

pub use config::{Config, SftpAuth};
pub use error::ConfigError;
pub use keyfile::KeyFile;

/// Result type for config and key-file operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
