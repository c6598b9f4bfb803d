//! In-memory adapters for the registry and configuration ports

pub mod configuration;
pub mod registry;

pub use configuration::InMemoryConfigurationStore;
pub use registry::InMemoryServiceRegistry;
