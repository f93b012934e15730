//! Chunk-level encryption for dsdrive's attachment store.
//!
//! Every file chunk is encrypted independently before it is uploaded, and
//! decrypted independently after download. The envelope format is fixed by
//! the remote service this crate was built against: PKCS#7-padded AES-256-CBC
//! under a SHA-256-derived key, base64-encoded with the IV prepended.

pub mod codec;
pub mod error;

pub use codec::ChunkCodec;
pub use error::CryptoError;

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
