//! File logging for the recorder.
//!
//! The TUI owns the terminal, so log output goes to a daily-rotated file
//! under the user's state directory instead of stderr. Rotated files older
//! than a week are pruned at startup.

use crate::config::file::log_dir;
use anyhow::Context;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

const LOG_FILE_PREFIX: &str = "vrec.log";
const RETAIN_DAYS: i64 = 7;

/// Sets up the daily-rotated file logger.
///
/// The returned guard flushes the writer on drop and must be held for the
/// lifetime of the process. The level filter comes from `RUST_LOG`,
/// defaulting to `info`.
///
/// # Errors
/// - If the log directory cannot be created
pub fn init_logging() -> anyhow::Result<WorkerGuard> {
    let dir = log_dir().context("could not set up the log directory")?;
    prune_old_logs(&dir, chrono::Local::now().date_naive());

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_FILE_PREFIX));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging to {}", dir.display());
    Ok(guard)
}

/// Deletes rotated log files dated [`RETAIN_DAYS`] or more before `today`.
/// The appender names them `vrec.log.YYYY-MM-DD`; anything else is left
/// alone.
fn prune_old_logs(dir: &Path, today: NaiveDate) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(LOG_FILE_PREFIX))
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if (today - date).num_days() >= RETAIN_DAYS {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Warning: could not remove old log {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_log_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vrec_logs_{}_{}", label, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_prune_drops_only_expired_log_files() {
        let dir = scratch_log_dir("prune");
        for name in [
            "vrec.log.2026-08-30",
            "vrec.log.2026-08-24",
            "vrec.log.2026-08-20",
            "vrec.log.not-a-date",
            "notes.txt",
        ] {
            fs::write(dir.join(name), "").unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        prune_old_logs(&dir, today);

        assert!(dir.join("vrec.log.2026-08-30").exists());
        assert!(dir.join("vrec.log.2026-08-24").exists());
        assert!(!dir.join("vrec.log.2026-08-20").exists());
        // Names that are not rotated log files are never touched.
        assert!(dir.join("vrec.log.not-a-date").exists());
        assert!(dir.join("notes.txt").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_tolerates_missing_directory() {
        prune_old_logs(
            Path::new("/nonexistent/vrec-logs"),
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        );
    }
}
