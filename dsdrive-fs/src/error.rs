//! The standard virtual-filesystem error taxonomy, mapped from
//! [`dsdrive_catalog::CatalogError`] and [`dsdrive_engine::EngineError`].

use thiserror::Error;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("resource not found")]
    ResourceNotFound,

    #[error("path does not refer to a directory")]
    DirectoryExpected,

    #[error("path does not refer to a file")]
    FileExpected,

    #[error("directory already exists")]
    DirectoryExists,

    #[error("file already exists")]
    FileExists,

    #[error("directory is not empty")]
    DirectoryNotEmpty,

    #[error("cannot remove the root directory")]
    RemoveRootError,

    #[error("path contains non-printable characters")]
    InvalidCharsInPath,

    #[error("handle is not open for reading")]
    NotReadable,

    #[error("handle is not open for writing")]
    NotWritable,

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("engine error: {0}")]
    Engine(#[from] dsdrive_engine::EngineError),
}

impl From<dsdrive_catalog::CatalogError> for FsError {
    fn from(err: dsdrive_catalog::CatalogError) -> Self {
        use dsdrive_catalog::CatalogError as C;
        match err {
            C::NotFound => FsError::ResourceNotFound,
            C::WrongKind => FsError::FileExpected,
            C::AlreadyExists => FsError::FileExists,
            C::NotEmpty => FsError::DirectoryNotEmpty,
            C::CannotRemoveRoot => FsError::RemoveRootError,
            other => FsError::Engine(dsdrive_engine::EngineError::Catalog(other)),
        }
    }
}
