//! # Google Compute Engine (GCE) Data Types
//!
//! Only the fields the inventory logs are modelled; everything else in the
//! instance resource is ignored on deserialisation.

use serde::{Deserialize, Serialize};

/// One page of an `instances.list` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceList {
    /// Absent from the response when the zone has no instances.
    #[serde(default)]
    pub items: Vec<Instance>,
    /// Continuation token; `None` on the last page.
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

/// A VM instance as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Unique numeric id. The API encodes the uint64 as a JSON string.
    pub id: String,
    /// PROVISIONING, STAGING, RUNNING, STOPPING, STOPPED, SUSPENDED, TERMINATED, ...
    pub status: String,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
}

/// A disk attached to an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachedDisk {
    /// License resource URLs of the image the disk was created from.
    #[serde(default)]
    pub licenses: Vec<String>,
}

impl Instance {
    /// Licenses of the first attached disk (the boot disk), empty when the
    /// instance has no disks.
    pub fn first_disk_licenses(&self) -> &[String] {
        self.disks
            .first()
            .map(|d| d.licenses.as_slice())
            .unwrap_or(&[])
    }
}
