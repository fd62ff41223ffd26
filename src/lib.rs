// # gce-inventory
//
// Lists Compute Engine instances across a fixed set of projects and zones,
// writes one log line per instance to a run log (local file + console), and
// uploads that log to a Cloud Storage bucket under `logs/`.
//
// The binary keeps its legacy name, `install_uptycs`, although nothing is
// installed: the run only inventories instances and their disk licenses.

/// Shared HTTP client for all Google API calls.
pub mod client;

/// `config.json` loading.
pub mod config;

/// Run log written to a local file and the console at the same time.
pub mod logging;

/// Google Cloud Platform REST clients (auth, Compute Engine, Cloud Storage).
pub mod gcp;

/// Narrow traits over the provider calls the run needs, plus the GCP implementation.
pub mod provider;

/// Project x zone walk over the instance list API.
pub mod inventory;

/// The end-to-end run sequence driven by the binary.
pub mod app;

pub use config::{Config, ConfigError};
pub use inventory::{ErrorPolicy, Pagination, WalkOptions, WalkSummary};
pub use logging::LogHandler;
pub use provider::{ComputeApi, GcpProvider, ObjectStore};
