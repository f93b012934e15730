//! Signed CDN attachment locators.
//!
//! A [`Locator`] is a resolved-but-possibly-expiring reference to one
//! uploaded chunk on the remote CDN. This crate only knows how to parse,
//! render, and expiry-check them; refreshing an expired one is the
//! renewal policy's job.

pub mod error;
pub mod locator;

pub use error::LocatorError;
pub use locator::{Locator, EXPIRY_SKEW_SECS};

/// Result type for locator operations.
pub type Result<T> = std::result::Result<T, LocatorError>;
