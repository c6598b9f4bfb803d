//! Domain Layer - Service Component Runtime
//!
//! The component model and the contracts of every external collaborator.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value_objects`] | Descriptions, properties, filters, service identities |
//! | [`ports`] | Service registry, configuration provider, component traits |
//! | [`events`] | Lifecycle events published by the runtime |
//! | [`error`] | Domain error type |
//! | [`constants`] | Well-known property keys |
//!
//! This crate holds no engine logic; the engine lives in `scr-application`.

pub mod constants;
pub mod error;
pub mod events;
pub mod ports;
pub mod value_objects;

pub use error::{Error, Result};
pub use events::ComponentEvent;
pub use value_objects::*;
