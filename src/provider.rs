use anyhow::Result;
use async_trait::async_trait;

use crate::gcp::gce::{self, InstanceList};
use crate::gcp::gcs::{self, ObjectItem};

/// The single compute capability the inventory uses.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Lists one page of instances in `project` / `zone`.
    async fn list_instances(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<InstanceList>;
}

/// The single storage capability the log upload uses.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectItem>;
}

/// Compute Engine and Cloud Storage over their REST APIs, authenticated with
/// Application Default Credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct GcpProvider;

#[async_trait]
impl ComputeApi for GcpProvider {
    async fn list_instances(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<InstanceList> {
        gce::list_instances(project, zone, page_token).await
    }
}

#[async_trait]
impl ObjectStore for GcpProvider {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectItem> {
        gcs::upload_object(bucket, name, data, content_type).await
    }
}

/// In-memory stand-ins for the provider, shared by the unit tests.
#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use anyhow::bail;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::gcp::gce::{AttachedDisk, Instance};

    pub fn instance(name: &str, id: &str, status: &str, licenses: &[&str]) -> Instance {
        Instance {
            name: name.to_string(),
            id: id.to_string(),
            status: status.to_string(),
            disks: vec![AttachedDisk {
                licenses: licenses.iter().map(|l| l.to_string()).collect(),
            }],
        }
    }

    /// Serves canned pages keyed by (project, zone, page token) and records
    /// every call in order. Unknown pairs return an empty page.
    #[derive(Default)]
    pub struct FakeCompute {
        pages: HashMap<(String, String, Option<String>), InstanceList>,
        failing: Vec<(String, String)>,
        pub calls: Mutex<Vec<(String, String, Option<String>)>>,
    }

    impl FakeCompute {
        pub fn with_page(
            mut self,
            project: &str,
            zone: &str,
            token: Option<&str>,
            items: Vec<Instance>,
            next: Option<&str>,
        ) -> Self {
            self.pages.insert(
                (
                    project.to_string(),
                    zone.to_string(),
                    token.map(str::to_string),
                ),
                InstanceList {
                    items,
                    next_page_token: next.map(str::to_string),
                },
            );
            self
        }

        pub fn failing(mut self, project: &str, zone: &str) -> Self {
            self.failing.push((project.to_string(), zone.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<(String, String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ComputeApi for FakeCompute {
        async fn list_instances(
            &self,
            project: &str,
            zone: &str,
            page_token: Option<&str>,
        ) -> Result<InstanceList> {
            self.calls.lock().unwrap().push((
                project.to_string(),
                zone.to_string(),
                page_token.map(str::to_string),
            ));
            if self
                .failing
                .iter()
                .any(|(p, z)| p == project && z == zone)
            {
                bail!("403 Forbidden: compute.instances.list denied on {}", project);
            }
            let key = (
                project.to_string(),
                zone.to_string(),
                page_token.map(str::to_string),
            );
            Ok(self.pages.get(&key).cloned().unwrap_or_default())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Upload {
        pub bucket: String,
        pub name: String,
        pub data: Vec<u8>,
        pub content_type: String,
    }

    #[derive(Default)]
    pub struct FakeStore {
        pub reject: bool,
        /// Directory renamed (from, to) once an upload succeeds.
        pub relocate: Option<(PathBuf, PathBuf)>,
        pub uploads: Mutex<Vec<Upload>>,
    }

    impl FakeStore {
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::default()
            }
        }

        /// Accepts uploads, then moves `from` to `to` so that later steps
        /// find the directory gone.
        pub fn relocating(from: &Path, to: &Path) -> Self {
            Self {
                relocate: Some((from.to_path_buf(), to.to_path_buf())),
                ..Self::default()
            }
        }

        pub fn uploads(&self) -> Vec<Upload> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn upload(
            &self,
            bucket: &str,
            name: &str,
            data: &[u8],
            content_type: &str,
        ) -> Result<ObjectItem> {
            if self.reject {
                bail!("GCS upload to gs://{}/{} failed (404 Not Found)", bucket, name);
            }
            self.uploads.lock().unwrap().push(Upload {
                bucket: bucket.to_string(),
                name: name.to_string(),
                data: data.to_vec(),
                content_type: content_type.to_string(),
            });
            if let Some((from, to)) = &self.relocate {
                std::fs::rename(from, to)?;
            }
            Ok(ObjectItem {
                name: name.to_string(),
                bucket: Some(bucket.to_string()),
                size: Some(data.len().to_string()),
                ..ObjectItem::default()
            })
        }
    }
}
