//! Structured logging setup with tracing

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flushes the log file writer when dropped
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Initialize the logging system
pub fn init_logging(default_level: &str) -> anyhow::Result<LogGuard> {
    let log_dir = super::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "viewer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(debug_assertions)]
    {
        // Development: pretty console output + file
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        // Release: JSON file only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    tracing::info!(dir = ?log_dir, "Logging initialized");
    Ok(LogGuard { _file: guard })
}

/// Clean up log files older than specified days
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    let log_dir = super::log_dir();
    cleanup_old_logs_in(&log_dir, days)
}

/// Remove rotated logs in `log_dir` not modified for `days` days
pub fn cleanup_old_logs_in(log_dir: &Path, days: u32) -> anyhow::Result<usize> {
    use std::time::{Duration, SystemTime};

    if !log_dir.exists() {
        return Ok(0);
    }

    let threshold = SystemTime::now()
        .checked_sub(Duration::from_secs(days as u64 * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Daily rotation names files viewer.log.YYYY-MM-DD
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("viewer.log"));
        if !is_log {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if matches!(modified, Ok(t) if t < threshold) && std::fs::remove_file(&path).is_ok() {
            deleted += 1;
            tracing::debug!("Deleted old log: {:?}", path);
        }
    }

    tracing::info!("Cleaned up {} old log files", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("viewer.log.2024-10-07"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(cleanup_old_logs_in(dir.path(), 7).unwrap(), 0);
        assert!(dir.path().join("viewer.log.2024-10-07").exists());

        // Zero-day retention: everything older than now goes, other files stay
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(cleanup_old_logs_in(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs_in(&dir.path().join("absent"), 1).unwrap(), 0);
    }
}
