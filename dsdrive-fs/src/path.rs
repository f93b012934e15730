//! Path validation shared by every facade entry point.

use crate::error::FsError;

/// Rejects any path containing a non-printable code point, matching the
/// source's `path.isprintable()` guard.
pub fn validatepath(path: &str) -> Result<(), FsError> {
    if path.chars().all(|c| !c.is_control()) {
        Ok(())
    } else {
        Err(FsError::InvalidCharsInPath)
    }
}
