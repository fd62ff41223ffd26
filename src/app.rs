use anyhow::{Context, Result, bail};
use log::LevelFilter;
use std::path::Path;

use crate::config::Config;
use crate::inventory::{self, WalkOptions, WalkSummary};
use crate::logging::LogHandler;
use crate::provider::{ComputeApi, ObjectStore};

/// Python-style JSON list (`["a", "b"]`) for the summary lines.
fn json_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s)))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Runs the whole inventory: summary lines, project x zone walk, log upload,
/// local log cleanup. Each step finishes before the next starts.
///
/// A fail-fast walk error or an upload error stops the run right there; in
/// that case the log stays on local disk only.
pub async fn run<C, S>(
    config: &Config,
    config_path: &Path,
    log: &LogHandler,
    compute: &C,
    store: &S,
    options: &WalkOptions,
) -> Result<WalkSummary>
where
    C: ComputeApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    log.info(format!(
        "Starting instance inventory for GCP projects: {}",
        json_list(&config.project_list)
    ));
    log.info(format!(
        "Zones read from {}: {}",
        config_path.display(),
        json_list(&config.zone_list)
    ));
    log.info(format!(
        "Using storage bucket (for logs): {}",
        config.storage_bucket
    ));

    let summary = match inventory::walk(config, compute, log, options).await {
        Ok(summary) => summary,
        Err(e) => {
            log.error(format!("Inventory aborted: {:#}", e));
            return Err(e);
        }
    };
    log.info(format!(
        "Inventory finished: {} project/zone pairs, {} instances, {} failed pairs",
        summary.pairs,
        summary.instances,
        summary.failures.len()
    ));

    if let Err(e) = log.copy_to_bucket(store, &config.storage_bucket).await {
        log.error(format!("{:#}", e));
        return Err(e);
    }

    if let Err(e) = log.remove_old_local_logs() {
        log.error(format!("{:#}", e));
        return Err(e);
    }

    if !summary.failures.is_empty() {
        bail!(
            "{} of {} project/zone pairs could not be listed",
            summary.failures.len(),
            config.pair_count()
        );
    }
    Ok(summary)
}

/// Loads the config, opens the run log and runs the inventory.
///
/// The config comes first: when it is missing or invalid no log file is
/// created and neither `compute` nor `store` is touched. With no `log_dir`
/// the log file goes to the working directory.
pub async fn start<C, S>(
    config_path: &Path,
    log_dir: Option<&Path>,
    log_name: &str,
    log_level: LevelFilter,
    compute: &C,
    store: &S,
    options: &WalkOptions,
) -> Result<WalkSummary>
where
    C: ComputeApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    let config = Config::load(config_path)?;

    let log = match log_dir {
        Some(dir) => LogHandler::in_dir(dir, log_name, log_level),
        None => LogHandler::new(log_name, log_level),
    }
    .context("Failed to set up the run log")?;

    run(&config, config_path, &log, compute, store, options).await
}
