//! # Google Compute Engine (GCE) Client
//!
//! Read-only access to Compute Engine: listing the VM instances of one
//! project and zone, one page at a time.
//!
//! ## Submodules
//! - `client`: the `instances.list` request.
//! - `types`: the subset of the instance resource that the inventory reads.

/// Core client for GCE API requests.
pub mod client;
/// Data structures for the GCE API.
pub mod types;

pub use crate::gcp::gce::client::list_instances;
pub use crate::gcp::gce::types::*;
