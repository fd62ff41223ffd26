//! # Instance Inventory
//!
//! Walks the full project x zone cross product from the config, lists the
//! instances of each pair and logs one line per instance with its name, id,
//! status and the licenses of its first disk. Pairs without instances produce
//! no output.
//!
//! Calls are strictly sequential: project list order, then zone list order.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::gcp::gce::Instance;
use crate::logging::LogHandler;
use crate::provider::ComputeApi;

/// How many pages of `instances.list` to read per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    /// Follow `nextPageToken` until the listing is exhausted.
    #[default]
    AllPages,
    /// One call per pair; instances past the first page are not reported.
    FirstPageOnly,
}

/// What to do when listing one pair fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the walk on the first failure.
    #[default]
    FailFast,
    /// Log the failure, remember it and move on to the next pair.
    KeepGoing,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub pagination: Pagination,
    pub on_error: ErrorPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFailure {
    pub project: String,
    pub zone: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// (project, zone) pairs visited.
    pub pairs: usize,
    /// `instances.list` calls issued.
    pub calls: usize,
    /// Instance lines logged.
    pub instances: usize,
    pub failures: Vec<PairFailure>,
}

/// Lazy sequence of instance pages for one (project, zone) pair.
///
/// Each call to [`InstancePages::next_page`] issues at most one list call;
/// the sequence ends after the page without a continuation token, or after
/// the first page with [`Pagination::FirstPageOnly`].
pub struct InstancePages<'a, C: ComputeApi + ?Sized> {
    compute: &'a C,
    project: &'a str,
    zone: &'a str,
    pagination: Pagination,
    next_token: Option<String>,
    done: bool,
    calls: usize,
}

impl<'a, C: ComputeApi + ?Sized> InstancePages<'a, C> {
    pub fn new(compute: &'a C, project: &'a str, zone: &'a str, pagination: Pagination) -> Self {
        Self {
            compute,
            project,
            zone,
            pagination,
            next_token: None,
            done: false,
            calls: 0,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<Instance>>> {
        if self.done {
            return Ok(None);
        }
        let result = self
            .compute
            .list_instances(self.project, self.zone, self.next_token.as_deref())
            .await;
        self.calls += 1;
        let page = result.with_context(|| {
            format!(
                "Failed to list instances for project {} in zone {}",
                self.project, self.zone
            )
        })?;
        self.next_token = page.next_page_token.filter(|t| !t.is_empty());
        self.done = self.pagination == Pagination::FirstPageOnly || self.next_token.is_none();
        Ok(Some(page.items))
    }

    /// List calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

/// The log line for one instance.
pub fn instance_line(project: &str, zone: &str, instance: &Instance) -> String {
    let licenses = serde_json::to_string(instance.first_disk_licenses())
        .unwrap_or_else(|_| "[]".to_string());
    format!(
        "project: {}, zone: {}, name: {}, id: {}, status: {}, licenses: {}",
        project, zone, instance.name, instance.id, instance.status, licenses
    )
}

/// Lists and logs every instance of every configured (project, zone) pair.
pub async fn walk<C: ComputeApi + ?Sized>(
    config: &Config,
    compute: &C,
    log: &LogHandler,
    options: &WalkOptions,
) -> Result<WalkSummary> {
    let mut summary = WalkSummary::default();

    for project in &config.project_list {
        for zone in &config.zone_list {
            summary.pairs += 1;
            let mut pages = InstancePages::new(compute, project, zone, options.pagination);
            let result = log_pair(&mut pages, project, zone, log).await;
            summary.calls += pages.calls();
            match result {
                Ok(count) => summary.instances += count,
                Err(e) => match options.on_error {
                    ErrorPolicy::FailFast => return Err(e),
                    ErrorPolicy::KeepGoing => {
                        log.error(format!("{:#}", e));
                        summary.failures.push(PairFailure {
                            project: project.clone(),
                            zone: zone.clone(),
                            error: format!("{:#}", e),
                        });
                    }
                },
            }
        }
    }

    Ok(summary)
}

async fn log_pair<C: ComputeApi + ?Sized>(
    pages: &mut InstancePages<'_, C>,
    project: &str,
    zone: &str,
    log: &LogHandler,
) -> Result<usize> {
    let mut count = 0;
    while let Some(items) = pages.next_page().await? {
        for instance in &items {
            log.info(instance_line(project, zone, instance));
            count += 1;
        }
    }
    Ok(count)
}
