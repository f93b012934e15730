//! Error types for the dsdrive-catalog crate.

use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failure modes of a [`crate::Catalog`] operation.
///
/// These map 1:1 onto the status codes `§4.5` of the node tree's source
/// design (0=OK, 1=NotFound, 2=WrongKind, 3=AlreadyExists/NotEmpty,
/// 4=CannotRemoveRoot), expressed as a proper error enum instead of a
/// bare integer so callers get exhaustiveness checking.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No node exists at the requested path.
    #[error("no node at the requested path")]
    NotFound,

    /// A node exists but is the wrong kind (file where a folder was
    /// expected, or vice versa).
    #[error("node is the wrong kind for this operation")]
    WrongKind,

    /// A node already exists where one would be created, and the
    /// operation was not told to tolerate that.
    #[error("node already exists")]
    AlreadyExists,

    /// A folder has children and the operation requires it to be empty.
    #[error("folder is not empty")]
    NotEmpty,

    /// An operation tried to remove the catalog's unique root.
    #[error("cannot remove the root")]
    CannotRemoveRoot,

    /// The underlying document store rejected or failed an operation.
    #[error("document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    /// A field failed to convert to its BSON representation during an
    /// update.
    #[error("BSON serialization error: {0}")]
    BsonSerialize(#[from] bson::ser::Error),

    /// A stored locator carried a value too large to survive the
    /// signed/unsigned round trip through BSON's `i64` fields.
    #[error("{field} overflows a 64-bit signed integer")]
    IntegerOverflow { field: &'static str },

    /// A stored chunk filename was not valid UTF-8.
    #[error("chunk filename is not valid UTF-8: {0}")]
    NonUtf8Filename(#[from] std::string::FromUtf8Error),

    /// A locator failed to parse back out of its persisted form.
    #[error("stored locator is malformed: {0}")]
    MalformedLocator(#[from] dsdrive_locator::LocatorError),
}
