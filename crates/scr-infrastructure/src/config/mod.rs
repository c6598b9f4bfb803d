//! Configuration management
//!
//! Engine settings plus the configuration data seeded into the in-memory
//! configuration store, loaded from defaults, TOML and the environment.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{FactoryConfigurationSeed, LoggingConfig, RuntimeConfig, ScrConfig};
