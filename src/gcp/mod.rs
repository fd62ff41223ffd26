//! Minimal REST clients for the Google APIs used by the inventory run.
//!
//! Every call shares [`crate::client::CLIENT`] and authenticates with a
//! bearer token from [`auth::get_access_token`].

pub mod auth;

pub mod gcs;

pub mod gce;

pub mod types;

pub use auth::get_access_token;
