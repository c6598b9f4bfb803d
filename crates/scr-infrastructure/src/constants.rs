//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Domain-specific constants are defined in `scr_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "scr.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "scr";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "SCR";

/// Separator between nested keys in environment variable names
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_ENV_FILTER: &str = "SCR_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File stem used when the log file path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "scr";

// ============================================================================
// RUNTIME CONSTANTS
// ============================================================================

/// Default shutdown timeout in milliseconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// CONFIGURATION STORE CONSTANTS
// ============================================================================

/// Separator between a factory PID and the generated instance suffix
pub const FACTORY_PID_SEPARATOR: &str = "-";
