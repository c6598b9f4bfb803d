//! Structured logging with tracing
//!
//! One global subscriber: an `EnvFilter` (overridable through `SCR_LOG`)
//! over a stdout layer and, optionally, a daily-rolling file layer written
//! through a non-blocking worker. The file worker lives as long as the
//! returned [`LoggingGuard`].

use crate::constants::{DEFAULT_LOG_FILE_STEM, LOG_ENV_FILTER};
use crate::error_ext::ErrorContext;
use scr_domain::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{Level, debug, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes and stops the log file writer when dropped
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard {
    file: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// True if a file layer is installed
    pub fn writes_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Install the global subscriber described by `config`
///
/// Fails if the level is unknown or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(&config.level)?;
    let filter = EnvFilter::try_from_env(LOG_ENV_FILTER).unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.json_format)];
    let mut guard = LoggingGuard::default();
    if let Some(path) = &config.file_output {
        let (writer, worker) = file_writer(path);
        layers.push(file_layer(config.json_format, writer));
        guard.file = Some(worker);
    }

    Registry::default()
        .with(layers.with_filter(filter))
        .try_init()
        .config_context("Failed to install the log subscriber")?;

    info!(%level, json = config.json_format, file = ?config.file_output, "logging initialized");
    Ok(guard)
}

/// Install logging unless some subscriber already owns the process
///
/// Returns `None` when another subscriber was installed first, so embedders
/// and tests that set up their own tracing keep it.
pub fn try_init_logging(config: &LoggingConfig) -> Result<Option<LoggingGuard>> {
    if tracing::dispatcher::has_been_set() {
        parse_log_level(&config.level)?;
        debug!("global subscriber already installed; keeping it");
        return Ok(None);
    }
    init_logging(config).map(Some)
}

fn stdout_layer(json: bool) -> BoxedLayer {
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);
    if json { layer.json().boxed() } else { layer.boxed() }
}

fn file_layer(json: bool, writer: NonBlocking) -> BoxedLayer {
    let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
    if json { layer.json().boxed() } else { layer.boxed() }
}

fn file_writer(path: &Path) -> (NonBlocking, WorkerGuard) {
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let stem = path.file_stem().unwrap_or_else(|| OsStr::new(DEFAULT_LOG_FILE_STEM));
    tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, stem))
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::configuration(format!(
            "Invalid log level: {level}. Use trace, debug, info, warn, or error"
        ))),
    }
}

/// Log configuration loading status
pub fn log_config_loaded(config_path: &Path, success: bool) {
    if success {
        info!(path = %config_path.display(), "configuration loaded");
    } else {
        warn!(path = %config_path.display(), "configuration file not found");
    }
}
