//! # Google Cloud Storage (GCS) Client
//!
//! Write-only access to Cloud Storage: the run uploads its log file as a
//! single object.
//!
//! ## Submodules
//! - `client`: the media upload request.
//! - `types`: the object resource returned by the upload.

/// Core client for GCS API requests.
pub mod client;
/// Data structures for the GCS API.
pub mod types;

pub use client::upload_object;
pub use types::*;
