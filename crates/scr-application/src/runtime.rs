//! Service Component Runtime facade
//!
//! Wires the work queue, resolver and instance process to a service registry
//! and an optional configuration provider, and exposes enable/disable plus
//! introspection.

use crate::events::{ComponentEventBus, DEFAULT_EVENT_CAPACITY};
use crate::resolver::Resolver;
use crate::work_queue::WorkQueue;
use parking_lot::Mutex;
use scr_domain::error::Result;
use scr_domain::ports::{ConfigurationListener, ConfigurationProvider, ListenerId, ServiceListener, ServiceRegistry};
use scr_domain::{ComponentDescription, ComponentEvent, ConfigurationId, ServiceId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Default worker thread name
pub const DEFAULT_WORKER_NAME: &str = "scr-worker";

/// Default time `shutdown` waits for queued work
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime tuning
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Worker thread name
    pub worker_name: String,
    /// Event bus capacity
    pub event_capacity: usize,
    /// Time `shutdown` waits for queued work
    pub shutdown_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl RuntimeOptions {
    /// Set the worker thread name
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Set the event bus capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Snapshot of one enabled configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentState {
    /// Component name
    pub name: String,
    /// Configuration id
    pub id: ConfigurationId,
    /// PID of the backing configuration data
    pub pid: Option<String>,
    /// In the satisfied set
    pub satisfied: bool,
    /// Number of created instances
    pub instances: usize,
    /// Registered service, if any
    pub service_id: Option<ServiceId>,
    /// Producers not to be activated eagerly
    pub delay_notes: Vec<ConfigurationId>,
    /// Created through a component factory
    pub factory_instance: bool,
}

struct Subscriptions {
    service: ListenerId,
    configuration: Option<ListenerId>,
}

/// Declarative component lifecycle and dependency-resolution engine
pub struct ServiceComponentRuntime {
    registry: Arc<dyn ServiceRegistry>,
    configurations: Option<Arc<dyn ConfigurationProvider>>,
    queue: WorkQueue,
    events: ComponentEventBus,
    resolver: Arc<Resolver>,
    subscriptions: Mutex<Option<Subscriptions>>,
    options: RuntimeOptions,
}

impl ServiceComponentRuntime {
    /// Start the worker and subscribe to the registry and configuration store
    pub fn start(
        registry: Arc<dyn ServiceRegistry>,
        configurations: Option<Arc<dyn ConfigurationProvider>>,
        options: RuntimeOptions,
    ) -> Result<Self> {
        let queue = WorkQueue::start(&options.worker_name)?;
        let events = ComponentEventBus::new(options.event_capacity);
        let resolver = Resolver::new(
            Arc::clone(&registry),
            configurations.clone(),
            queue.clone(),
            events.clone(),
        );

        let service_listener: Arc<dyn ServiceListener> = resolver.clone();
        let service = registry.add_service_listener(service_listener);
        let configuration = configurations.as_ref().map(|provider| {
            let listener: Arc<dyn ConfigurationListener> = resolver.process().clone();
            provider.add_configuration_listener(listener)
        });

        info!(worker = %options.worker_name, "service component runtime started");
        Ok(Self {
            registry,
            configurations,
            queue,
            events,
            resolver,
            subscriptions: Mutex::new(Some(Subscriptions { service, configuration })),
            options,
        })
    }

    /// Enable component descriptions
    pub fn enable<I>(&self, descriptions: I) -> Result<()>
    where
        I: IntoIterator<Item = ComponentDescription>,
    {
        self.resolver.enable(descriptions)
    }

    /// Disable component descriptions by name
    pub fn disable<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolver.disable(names)
    }

    /// Re-run satisfaction resolution; returns the satisfied ids
    pub fn resolve(&self) -> Vec<ConfigurationId> {
        self.resolver.resolve()
    }

    /// Snapshot of every enabled configuration
    pub fn component_states(&self) -> Vec<ComponentState> {
        self.resolver
            .configurations()
            .iter()
            .map(|c| ComponentState {
                name: c.name().to_string(),
                id: c.id(),
                pid: c.pid().map(str::to_string),
                satisfied: self.resolver.is_satisfied(c.id()),
                instances: c.instance_count(),
                service_id: c.registration().map(|r| r.id()),
                delay_notes: c.delay_notes(),
                factory_instance: c.is_factory_instance(),
            })
            .collect()
    }

    /// States of the configurations of one description
    pub fn states_of(&self, name: &str) -> Vec<ComponentState> {
        self.component_states()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    /// True if the configuration is satisfied
    pub fn is_satisfied(&self, id: ConfigurationId) -> bool {
        self.resolver.is_satisfied(id)
    }

    /// True if the configuration is enabled
    pub fn is_enabled(&self, id: ConfigurationId) -> bool {
        self.resolver.is_enabled(id)
    }

    /// Ids of the enabled configurations
    pub fn enabled_ids(&self) -> Vec<ConfigurationId> {
        self.resolver.enabled_ids()
    }

    /// Ids of the satisfied configurations
    pub fn satisfied_ids(&self) -> Vec<ConfigurationId> {
        self.resolver.satisfied_ids()
    }

    /// Delay-activate notes of a configuration
    pub fn delay_notes(&self, id: ConfigurationId) -> Vec<ConfigurationId> {
        self.resolver
            .configuration(id)
            .map(|c| c.delay_notes())
            .unwrap_or_default()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ComponentEvent> {
        self.events.subscribe()
    }

    /// Block until the worker has drained every queued job; false on timeout
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }

    /// The service registry the runtime consumes
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// The resolver
    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Disable every component, then stop the worker
    pub fn shutdown(&self) {
        let Some(subscriptions) = self.subscriptions.lock().take() else {
            return;
        };
        info!("service component runtime shutting down");
        self.resolver.shutdown();
        if !self.queue.wait_idle(self.options.shutdown_timeout) {
            warn!(pending = self.queue.pending(), "shutdown timed out waiting for queued work");
        }
        self.queue.shutdown();

        self.registry.remove_service_listener(subscriptions.service);
        if let (Some(provider), Some(id)) = (&self.configurations, subscriptions.configuration) {
            provider.remove_configuration_listener(id);
        }
        info!("service component runtime stopped");
    }
}

impl Drop for ServiceComponentRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
