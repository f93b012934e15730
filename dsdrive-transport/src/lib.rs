//! Webhook transport for dsdrive's attachment store.
//!
//! Two concerns live here:
//! - [`UploadDispatcher`] rotates across a pool of webhook endpoints for
//!   chunk upload/download, absorbing the service's per-webhook rate limits.
//! - [`ExpiryRenewalPolicy`] refreshes signed CDN URLs once they (or will
//!   soon) expire, via a pluggable strategy.

pub mod dispatcher;
pub mod error;
pub mod renewal;

pub use dispatcher::{UploadDispatcher, UploadResponse};
pub use error::TransportError;
pub use renewal::{ApiRenewalPolicy, ExpiryRenewalPolicy};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
