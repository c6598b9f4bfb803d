//! Application Layer - Service Component Runtime
//!
//! The dependency-resolution and component lifecycle engine.
//!
//! ## Architecture
//!
//! Registry events and enable/disable calls enter the [`Resolver`], which
//! recomputes the satisfied set synchronously and queues lifecycle work on the
//! [`WorkQueue`]. One worker thread drains the queue into the
//! [`InstanceProcess`], which re-validates each item and delegates to the
//! [`BuildDispose`] engine to run user code.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`reference`] | Per-configuration binding state and target resolution |
//! | [`resolver`] | Satisfied set, cycle breaking, event routing |
//! | [`work_queue`] | FIFO dispatch to the worker thread |
//! | [`build`] | Instantiate, bind, activate, deactivate, unbind, release |
//! | [`instance_process`] | Queued work, service registration, configuration changes |
//! | [`registration`] | Lazy per-consumer and shared service registration |
//! | [`component_factory`] | Component factory service and instance handles |
//! | [`runtime`] | The [`ServiceComponentRuntime`] facade |
//!
//! ## Dependencies
//!
//! This crate depends only on `scr-domain` and pure Rust libraries.

pub mod build;
pub mod component_factory;
pub mod configuration;
pub mod events;
pub mod instance_process;
pub mod reference;
pub mod registration;
pub mod resolver;
pub mod runtime;
pub mod work_queue;

pub use build::{BuildDispose, ConfigurationLookup, DisposeReason};
pub use component_factory::{ComponentFactoryService, ComponentInstanceHandle};
pub use configuration::{ComponentConfiguration, ComponentInstance, Lifecycle};
pub use events::ComponentEventBus;
pub use instance_process::InstanceProcess;
pub use reference::Reference;
pub use resolver::Resolver;
pub use runtime::{ComponentState, RuntimeOptions, ServiceComponentRuntime};
pub use work_queue::{WorkAction, WorkDispatcher, WorkQueue};
