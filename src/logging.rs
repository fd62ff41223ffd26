//! # Run Log
//!
//! [`LogHandler`] writes every record to a local file and to the console at
//! the same time. At the end of a run the file is copied to a storage bucket
//! with [`LogHandler::copy_to_bucket`] and older local log files are removed
//! with [`LogHandler::remove_old_local_logs`].
//!
//! The fern dispatch is owned by the handler instead of being installed as
//! the process-wide `log` logger, so callers pass the handler explicitly to
//! whatever needs to log.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::{Level, LevelFilter, Log, Record};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::gcp::gcs::ObjectItem;
use crate::provider::ObjectStore;

pub const DEFAULT_LOG_NAME: &str = "install_uptycs";

const LOG_EXTENSION: &str = "log";
const LOG_CONTENT_TYPE: &str = "text/plain";
/// Folder inside the bucket that receives the log files.
const BUCKET_LOG_PREFIX: &str = "logs/";

pub struct LogHandler {
    name: String,
    level: LevelFilter,
    log_dir: PathBuf,
    log_filename: String,
    logger: Box<dyn Log>,
}

impl LogHandler {
    /// Creates a handler logging to `<name>-<timestamp>.log` in the working
    /// directory.
    pub fn new(name: &str, level: LevelFilter) -> Result<Self> {
        Self::in_dir(".", name, level)
    }

    /// Creates a handler whose log file lives in `dir`. The file is created
    /// (or opened for append) immediately.
    pub fn in_dir(dir: impl AsRef<Path>, name: &str, level: LevelFilter) -> Result<Self> {
        let log_dir = dir.as_ref().to_path_buf();
        let log_filename = unique_log_filename(&log_dir, name, Local::now().naive_local());
        let log_path = log_dir.join(&log_filename);

        let file = fern::log_file(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

        let (_, logger) = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} - {} - {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                    level_name(record.level()),
                    message
                ))
            })
            .level(level)
            .chain(file)
            .chain(std::io::stderr())
            .into_log();

        Ok(Self {
            name: name.to_string(),
            level,
            log_dir,
            log_filename,
            logger,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// File name (without directory) of the active log file.
    pub fn log_filename(&self) -> &str {
        &self.log_filename
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_filename)
    }

    /// Writes one record to both sinks unless `level` is below the handler's
    /// minimum level.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if level > self.level {
            return;
        }
        self.logger.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(&self.name)
                .build(),
        );
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    pub fn flush(&self) {
        self.logger.flush();
    }

    /// Copies the log file to `bucket_name` under `logs/<filename>`.
    pub async fn copy_to_bucket<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        bucket_name: &str,
    ) -> Result<ObjectItem> {
        self.flush();
        let path = self.log_path();
        let data =
            fs::read(&path).with_context(|| format!("Failed to read log file {}", path.display()))?;
        let key = bucket_key(&self.log_filename);
        store
            .upload(bucket_name, &key, &data, LOG_CONTENT_TYPE)
            .await
            .with_context(|| format!("Failed to copy log file to gs://{}/{}", bucket_name, key))
    }

    /// Deletes every `*.log` file in the log directory except the active one.
    ///
    /// A file that cannot be deleted is reported as a warning and skipped.
    /// Returns the number of files removed.
    pub fn remove_old_local_logs(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.log_dir)
            .with_context(|| format!("Failed to list {}", self.log_dir.display()))?;

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.warning(format!("Skipping unreadable directory entry: {}", e));
                    continue;
                }
            };
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || !has_log_extension(&path) {
                continue;
            }
            if entry.file_name().to_str() == Some(self.log_filename.as_str()) {
                continue;
            }
            if self.remove_log_file(&path) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Deletes one old log file. A failure becomes a WARNING line and `false`.
    fn remove_log_file(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                self.debug(format!("Removed old local log {}", path.display()));
                true
            }
            Err(e) => {
                self.warning(format!("Could not remove {}: {}", path.display(), e));
                false
            }
        }
    }
}

/// Object key of a log file inside the bucket.
pub fn bucket_key(log_filename: &str) -> String {
    format!("{}{}", BUCKET_LOG_PREFIX, log_filename)
}

fn has_log_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// `<name>-YYYY-MM-DD_HH_MM_SS.log`
fn log_filename_for(name: &str, now: NaiveDateTime) -> String {
    format!(
        "{}-{}.{}",
        name,
        now.format("%Y-%m-%d_%H_%M_%S"),
        LOG_EXTENSION
    )
}

/// Second resolution can collide for back-to-back runs; a numeric suffix
/// keeps the active file distinct from any existing one.
fn unique_log_filename(dir: &Path, name: &str, now: NaiveDateTime) -> String {
    let base = log_filename_for(name, now);
    if !dir.join(&base).exists() {
        return base;
    }
    let stem = base.trim_end_matches(&format!(".{}", LOG_EXTENSION)).to_string();
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}.{}", stem, n, LOG_EXTENSION);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fakes::FakeStore;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn log_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".log"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn filename_has_prefix_and_timestamp() {
        assert_eq!(
            log_filename_for("install_uptycs", fixed_time()),
            "install_uptycs-2024-01-02_03_04_05.log"
        );
    }

    #[test]
    fn filename_gets_suffix_when_taken() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run-2024-01-02_03_04_05.log"), "").unwrap();
        fs::write(dir.path().join("run-2024-01-02_03_04_05-1.log"), "").unwrap();
        assert_eq!(
            unique_log_filename(dir.path(), "run", fixed_time()),
            "run-2024-01-02_03_04_05-2.log"
        );
    }

    #[test]
    fn construction_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "install_uptycs", LevelFilter::Info).unwrap();
        assert!(log.log_path().exists());
        assert!(log.log_filename().starts_with("install_uptycs-"));
        assert!(log.log_filename().ends_with(".log"));
        assert_eq!(log.name(), "install_uptycs");
        assert_eq!(log.level(), LevelFilter::Info);
    }

    #[test]
    fn lines_are_formatted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Info).unwrap();
        log.debug("hidden");
        log.info("hello");
        log.warning("careful");
        log.error("broken");
        log.flush();

        let content = fs::read_to_string(log.log_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" - INFO - hello"));
        assert!(lines[1].ends_with(" - WARNING - careful"));
        assert!(lines[2].ends_with(" - ERROR - broken"));
        assert!(!content.contains("hidden"));

        // "2024-01-02 03:04:05,678"
        let timestamp = lines[0].split(" - ").next().unwrap();
        assert_eq!(timestamp.len(), 23);
        assert_eq!(&timestamp[10..11], " ");
        assert_eq!(&timestamp[19..20], ",");
    }

    #[test]
    fn debug_level_keeps_debug_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Debug).unwrap();
        log.debug("details");
        log.flush();
        let content = fs::read_to_string(log.log_path()).unwrap();
        assert!(content.contains(" - DEBUG - details"));
    }

    #[test]
    fn remove_old_local_logs_keeps_only_active_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("install_uptycs-2023-12-31_23_59_59.log"), "old").unwrap();
        fs::write(dir.path().join("other.log"), "old").unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("archive.log")).unwrap();

        let log = LogHandler::in_dir(dir.path(), "install_uptycs", LevelFilter::Info).unwrap();
        let removed = log.remove_old_local_logs().unwrap();

        assert_eq!(removed, 2);
        assert_eq!(log_files(dir.path()), vec![log.log_filename().to_string()]);
        assert!(dir.path().join("config.json").exists());
        assert!(dir.path().join("archive.log").is_dir());
    }

    #[test]
    fn remove_old_local_logs_with_nothing_to_remove() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Info).unwrap();
        assert_eq!(log.remove_old_local_logs().unwrap(), 0);
        assert!(log.log_path().exists());
    }

    #[test]
    fn failed_delete_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Info).unwrap();
        let gone = dir.path().join("already-gone.log");

        assert!(!log.remove_log_file(&gone));
        log.flush();
        let content = fs::read_to_string(log.log_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" - WARNING - Could not remove "));
        assert!(lines[0].contains("already-gone.log"));
    }

    #[test]
    fn successful_delete_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.log");
        fs::write(&old, "old").unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Info).unwrap();

        assert!(log.remove_log_file(&old));
        assert!(!old.exists());
    }

    #[tokio::test]
    async fn copy_to_bucket_uploads_under_logs_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "install_uptycs", LevelFilter::Info).unwrap();
        log.info("inventory done");

        let store = FakeStore::default();
        let item = log.copy_to_bucket(&store, "my-bucket").await.unwrap();

        let uploads = store.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bucket, "my-bucket");
        assert_eq!(uploads[0].name, format!("logs/{}", log.log_filename()));
        assert_eq!(uploads[0].content_type, "text/plain");
        assert!(
            String::from_utf8_lossy(&uploads[0].data).contains(" - INFO - inventory done")
        );
        assert_eq!(item.name, uploads[0].name);
    }

    #[tokio::test]
    async fn copy_to_bucket_reports_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogHandler::in_dir(dir.path(), "run", LevelFilter::Info).unwrap();
        let err = log
            .copy_to_bucket(&FakeStore::rejecting(), "missing-bucket")
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("gs://missing-bucket/logs/"));
    }
}
