//! Configuration types

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_SHUTDOWN_TIMEOUT_MS};
use scr_application::RuntimeOptions;
use scr_application::events::DEFAULT_EVENT_CAPACITY;
use scr_application::runtime::DEFAULT_WORKER_NAME;
use scr_domain::Properties;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrConfig {
    /// Logging settings
    pub logging: LoggingConfig,

    /// Engine settings
    pub runtime: RuntimeConfig,

    /// Singleton configuration data keyed by PID
    pub configurations: BTreeMap<String, Properties>,

    /// Factory configuration data
    pub factory_configurations: Vec<FactoryConfigurationSeed>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install the global subscriber when the runtime context starts
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to file in addition to stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker thread name
    pub worker_name: String,

    /// Time shutdown waits for queued work, in milliseconds
    pub shutdown_timeout_ms: u64,

    /// Lifecycle event bus capacity
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Engine options for these settings
    pub fn options(&self) -> RuntimeOptions {
        RuntimeOptions::default()
            .with_worker_name(self.worker_name.clone())
            .with_event_capacity(self.event_capacity)
            .with_shutdown_timeout(Duration::from_millis(self.shutdown_timeout_ms))
    }
}

/// One factory configuration to create at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfigurationSeed {
    /// Factory PID the configuration belongs to
    pub factory_pid: String,

    /// Configuration data
    #[serde(default)]
    pub properties: Properties,
}
