//! Infrastructure Layer - Service Component Runtime
//!
//! Cross-cutting concerns around the engine.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `ScrConfig` and the Figment-based loader |
//! | [`logging`] | Tracing subscriber initialisation |
//! | [`error_ext`] | Context helpers converting foreign errors |
//! | [`adapters`] | In-memory service registry and configuration store |
//! | [`bootstrap`] | Composition root building a started runtime |
//! | [`constants`] | Infrastructure constants |

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

pub use adapters::{InMemoryConfigurationStore, InMemoryServiceRegistry};
pub use bootstrap::{RuntimeContext, init_runtime};
pub use config::{ConfigLoader, ScrConfig};
pub use error_ext::ErrorContext;
pub use logging::{LoggingGuard, init_logging, try_init_logging};
