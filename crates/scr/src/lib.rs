//! # Service Component Runtime
//!
//! Declarative component lifecycle and dependency resolution on top of a
//! dynamic service registry.
//!
//! Components are described by [`ComponentDescription`]s: the services they
//! reference, the services they provide and their configuration policy. The
//! runtime tracks which components are satisfied as providers come and go,
//! builds and activates them on a worker thread, and tears them down again
//! when a mandatory dependency disappears.
//!
//! ## Example
//!
//! ```ignore
//! use scr::{ComponentDescription, ReferenceDescription, ScrConfig, init_runtime};
//!
//! let context = init_runtime(ScrConfig::default())?;
//! context.runtime().enable([
//!     ComponentDescription::new("greeter", factory)
//!         .with_reference(ReferenceDescription::new("log", "ILog")),
//! ])?;
//! context.shutdown();
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Component model, LDAP filters, errors and port traits
//! - `application` - Resolver, work queue, build/dispose engine and the runtime facade
//! - `infrastructure` - Configuration, logging and in-memory adapters

/// Domain layer - component model and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use scr_domain::*;
}

/// Application layer - the resolution and lifecycle engine
///
/// Re-exports from the application crate for convenience
pub mod application {
    pub use scr_application::*;
}

/// Infrastructure layer - config, logging and adapters
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use scr_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the engine facade
pub use application::{ComponentState, RuntimeOptions, ServiceComponentRuntime};

// Re-export the composition root
pub use infrastructure::{ConfigLoader, RuntimeContext, ScrConfig, init_logging, init_runtime};
