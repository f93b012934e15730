//! Ties the metadata catalog, chunk codec and transport layers into
//! file-level send/download operations, plus a buffered file handle for
//! the filesystem facade to drive.

pub mod engine;
pub mod error;
pub mod handle;

pub use engine::{ChunkedObjectEngine, FileSource, CHUNK_SIZE};
pub use error::EngineError;
pub use handle::FileHandle;

/// Result type for engine and file-handle operations.
pub type Result<T> = std::result::Result<T, EngineError>;
