use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use gce_inventory::config::DEFAULT_CONFIG_PATH;
use gce_inventory::logging::DEFAULT_LOG_NAME;
use gce_inventory::{ErrorPolicy, GcpProvider, Pagination, WalkOptions, app};

#[derive(Parser, Debug)]
#[command(
    name = "install_uptycs",
    about = "List GCE instances across the configured projects and zones, then upload the run log to GCS"
)]
struct Args {
    /// JSON file with project_list, zone_list and storage_bucket
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Prefix of the local log file name
    #[arg(long, default_value = DEFAULT_LOG_NAME)]
    log_name: String,

    /// Directory holding the local log files [default: working directory]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Minimum level written to the log file and console (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Issue a single list call per project/zone instead of following page tokens
    #[arg(long)]
    first_page_only: bool,

    /// Continue with the next project/zone when listing one fails
    #[arg(long)]
    keep_going: bool,
}

impl Args {
    fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            pagination: if self.first_page_only {
                Pagination::FirstPageOnly
            } else {
                Pagination::AllPages
            },
            on_error: if self.keep_going {
                ErrorPolicy::KeepGoing
            } else {
                ErrorPolicy::FailFast
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let provider = GcpProvider;
    app::start(
        &args.config,
        args.log_dir.as_deref(),
        &args.log_name,
        args.log_level,
        &provider,
        &provider,
        &args.walk_options(),
    )
    .await?;
    Ok(())
}
