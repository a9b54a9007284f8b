//! Logging system initialization
//!
//! This module provides functions to initialize the tracing/logging system
//! based on application configuration.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE: &str = "geolookup.log";

/// Build the log writer described by the configuration
///
/// Falls back to stdout when the log file cannot be opened.
fn build_writer(config: &LoggingConfig) -> (Box<dyn Write + Send + Sync>, bool) {
    let Some(log_file) = config.file.as_deref().filter(|f| !f.is_empty()) else {
        return (Box::new(std::io::stdout()), true);
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path.parent().unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);

        match rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(filename.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups as usize)
            .build(dir)
        {
            Ok(appender) => (Box::new(appender), false),
            Err(e) => {
                eprintln!("Failed to create rolling log appender: {}, using stdout", e);
                (Box::new(std::io::stdout()), true)
            }
        }
    } else {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
        {
            Ok(file) => (Box::new(file), false),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}, using stdout", log_file, e);
                (Box::new(std::io::stdout()), true)
            }
        }
    }
}

/// Initialize logging system based on configuration
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   to ensure non-blocking log writes are flushed
///
/// Calling this more than once keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    let (writer, is_console) = build_writer(config);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);

    // RUST_LOG 优先于配置文件
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.clone()));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(is_console);

    let result = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }

    guard
}
