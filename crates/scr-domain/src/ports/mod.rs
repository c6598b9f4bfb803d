//! Domain Port Interfaces
//!
//! Boundary contracts between the engine and its external collaborators.
//!
//! ## Organization
//!
//! - **component** - implementation objects, their factories and activation context
//! - **registry** - the service registry and its event stream
//! - **configuration** - the persistent configuration store

/// Component implementation ports
pub mod component;
/// Configuration provider port
pub mod configuration;
/// Service registry port
pub mod registry;

pub use component::{Binding, Component, ComponentContext, ComponentFactory};
pub use configuration::{
    ConfigurationEvent, ConfigurationEventKind, ConfigurationListener, ConfigurationProvider,
};
pub use registry::{
    ListenerId, ServiceEvent, ServiceEventKind, ServiceFactory, ServiceListener, ServiceRegistry,
    ServiceSource,
};
