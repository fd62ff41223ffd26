//! # Run Configuration
//!
//! The run is driven by a single JSON file (by default `config.json` in the
//! working directory):
//!
//! ```json
//! {
//!   "project_list": ["proj-a", "proj-b"],
//!   "zone_list": ["us-central1-a", "us-east1-b"],
//!   "storage_bucket": "my-bucket"
//! }
//! ```
//!
//! The file is read once at startup and never modified. There is no
//! validation beyond "the file exists and has these keys with these types".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Projects to inventory, visited in this order.
    pub project_list: Vec<String>,
    /// Zones queried in every project, visited in this order.
    pub zone_list: Vec<String>,
    /// Bucket receiving the run log under `logs/`.
    pub storage_bucket: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    /// Reads and parses the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Number of (project, zone) pairs the walk will visit.
    pub fn pair_count(&self) -> usize {
        self.project_list.len() * self.zone_list.len()
    }
}
