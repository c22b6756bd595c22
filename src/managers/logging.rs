//! Logging manager with file rotation
//!
//! Dual-output logging:
//! - Console: INFO level with concise format
//! - File: configurable level with daily rotation

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{expand_tilde, LoggingSettings};

/// Resolved logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_directory: PathBuf,
    /// Level for file output (console always uses INFO)
    pub log_level: Level,
    pub max_files: u32,
}

impl LoggingConfig {
    /// Create from config file settings
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        let level = match settings.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Self {
            log_directory: settings.log_directory.clone(),
            log_level: level,
            max_files: settings.log_max_files,
        }
    }
}

/// Initialize logging with console and file outputs
///
/// Returns a guard that must be kept alive for the duration of the program;
/// dropping it flushes remaining logs to disk.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let log_dir = expand_tilde(&config.log_directory);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "backup-rotator.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(config.log_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(Level::INFO));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    cleanup_old_logs(&log_dir, config.max_files)?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Initialize simple console-only logging (for commands that run before the
/// config file is trusted)
pub fn init_console_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("backup_rotator={}", level))
            .add_directive(format!("{}", level).parse().unwrap())
    })
}

/// Cleanup old log files, keeping only the most recent N files
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("backup-rotator") && name.contains(".log")
        })
        .collect();

    // Newest first by modification time
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    for file in log_files.into_iter().skip(max_files as usize) {
        if let Err(e) = fs::remove_file(file.path()) {
            tracing::warn!("Failed to remove old log file {:?}: {}", file.path(), e);
        }
    }

    Ok(())
}

/// Guard that keeps the logging system alive
pub struct LogGuard {
    _file_guard: WorkerGuard,
}
