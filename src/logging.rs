//! Logging setup for feedsync.
//!
//! Logs always go to stderr. `RUST_LOG`, when set, wins over the configured
//! level so a single run can be made noisier without editing the config.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{FeedsyncError, Result};

/// Build the event filter from a `RUST_LOG` value and the configured level.
fn build_filter(rust_log: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(directives)
            .map_err(|e| FeedsyncError::Config(format!("invalid RUST_LOG: {e}")));
    }

    let level: LevelFilter = level
        .trim()
        .parse()
        .map_err(|_| FeedsyncError::Config(format!("unknown log level: {level:?}")))?;
    Ok(EnvFilter::default().add_directive(level.into()))
}

/// Open the log file, creating its directory if needed.
fn open_log_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

/// Install the global subscriber.
///
/// With `config.file` set, every line is written to stderr and to the file,
/// without ANSI colors.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level)?;

    let (writer, ansi) = match config.file.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => {
            let file = Arc::new(open_log_file(path)?);
            (BoxMakeWriter::new(std::io::stderr.and(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| FeedsyncError::Config(format!("failed to install logger: {e}")))
}

/// Stderr-only logging used when [`init`] fails.
///
/// Falls back to `info` if neither `RUST_LOG` nor `level` parses.
pub fn init_console_only(level: &str) {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), level)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
