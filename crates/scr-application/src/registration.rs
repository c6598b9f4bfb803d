//! Lazy service registration
//!
//! Provided services are registered as registry [`ServiceFactory`]s so the
//! component is built only when a consumer first acquires the service.
//!
//! | Strategy | Instances |
//! |----------|-----------|
//! | [`PerConsumerService`] | one per consumer, disposed on its release |
//! | [`SharedService`] | one shared, ref-counted across consumers |

use crate::build::BuildDispose;
use crate::configuration::{ComponentConfiguration, ComponentInstance};
use dashmap::DashMap;
use parking_lot::Mutex;
use scr_domain::ports::{ServiceFactory, ServiceSource};
use scr_domain::{ConsumerId, ServiceObject, ServiceReference};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pick the registration strategy for a configuration
pub fn service_source(build: &Arc<BuildDispose>, configuration: &Arc<ComponentConfiguration>) -> ServiceSource {
    let factory: Arc<dyn ServiceFactory> = if configuration.description().is_service_factory() {
        Arc::new(PerConsumerService::new(Arc::clone(build), Arc::clone(configuration)))
    } else {
        Arc::new(SharedService::new(Arc::clone(build), Arc::clone(configuration)))
    };
    ServiceSource::Factory(factory)
}

fn exposed_service(configuration: &ComponentConfiguration, instance: &ComponentInstance) -> Option<ServiceObject> {
    let service = instance.service();
    if service.is_none() {
        warn!(
            component = configuration.name(),
            component_id = %configuration.id(),
            "component provides a service but exposes no service object"
        );
    }
    service
}

// ============================================================================
// Per-consumer factory
// ============================================================================

/// Builds a fresh instance for every consumer
pub struct PerConsumerService {
    build: Arc<BuildDispose>,
    configuration: Arc<ComponentConfiguration>,
    instances: DashMap<ConsumerId, Arc<ComponentInstance>>,
}

impl PerConsumerService {
    /// Create the strategy for `configuration`
    pub fn new(build: Arc<BuildDispose>, configuration: Arc<ComponentConfiguration>) -> Self {
        Self {
            build,
            configuration,
            instances: DashMap::new(),
        }
    }

    /// Number of consumers currently holding an instance
    pub fn consumer_count(&self) -> usize {
        self.instances.len()
    }
}

impl ServiceFactory for PerConsumerService {
    fn get_service(&self, consumer: &ConsumerId, _reference: &ServiceReference) -> Option<ServiceObject> {
        let instance = match self
            .build
            .build_component_config_instance(Some(consumer), &self.configuration)
        {
            Ok(instance) => instance,
            Err(e) => {
                warn!(component = self.configuration.name(), consumer = %consumer, error = %e, "per-consumer build failed");
                return None;
            }
        };
        let Some(service) = exposed_service(&self.configuration, &instance) else {
            self.build.dispose_component_instance(&self.configuration, &instance);
            return None;
        };
        if let Some(previous) = self.instances.insert(consumer.clone(), instance) {
            self.build.dispose_component_instance(&self.configuration, &previous);
        }
        Some(service)
    }

    fn unget_service(&self, consumer: &ConsumerId, _reference: &ServiceReference, _service: &ServiceObject) {
        if let Some((_, instance)) = self.instances.remove(consumer) {
            debug!(component = self.configuration.name(), consumer = %consumer, "disposing per-consumer instance");
            self.build.dispose_component_instance(&self.configuration, &instance);
        }
    }
}

// ============================================================================
// Shared, ref-counted
// ============================================================================

#[derive(Default)]
struct SharedState {
    count: usize,
    instance: Option<Arc<ComponentInstance>>,
    /// True if this strategy built the instance and therefore owns its disposal
    created: bool,
}

/// Shares one lazily built instance across all consumers
pub struct SharedService {
    build: Arc<BuildDispose>,
    configuration: Arc<ComponentConfiguration>,
    state: Mutex<SharedState>,
}

impl SharedService {
    /// Create the strategy for `configuration`
    pub fn new(build: Arc<BuildDispose>, configuration: Arc<ComponentConfiguration>) -> Self {
        Self {
            build,
            configuration,
            state: Mutex::new(SharedState::default()),
        }
    }

    /// Current acquisition count
    pub fn use_count(&self) -> usize {
        self.state.lock().count
    }

    fn shared_instance(&self) -> Option<Arc<ComponentInstance>> {
        if let Some(instance) = self.state.lock().instance.clone() {
            return Some(instance);
        }

        // Built without holding the state lock: activation may acquire this
        // service again from the same thread.
        let (instance, created) = match self.configuration.instances().into_iter().next() {
            Some(existing) => (existing, false),
            None => match self.build.build_component_config_instance(None, &self.configuration) {
                Ok(built) => (built, true),
                Err(e) => {
                    warn!(component = self.configuration.name(), error = %e, "shared build failed");
                    return None;
                }
            },
        };

        let mut state = self.state.lock();
        if let Some(raced) = state.instance.clone() {
            drop(state);
            if created {
                self.build.dispose_component_instance(&self.configuration, &instance);
            }
            return Some(raced);
        }
        state.instance = Some(Arc::clone(&instance));
        state.created = created;
        Some(instance)
    }
}

impl ServiceFactory for SharedService {
    fn get_service(&self, consumer: &ConsumerId, _reference: &ServiceReference) -> Option<ServiceObject> {
        let instance = self.shared_instance()?;
        let service = exposed_service(&self.configuration, &instance)?;
        let count = {
            let mut state = self.state.lock();
            state.count += 1;
            state.count
        };
        debug!(component = self.configuration.name(), consumer = %consumer, count, "shared service acquired");
        Some(service)
    }

    fn unget_service(&self, consumer: &ConsumerId, _reference: &ServiceReference, _service: &ServiceObject) {
        let release = {
            let mut state = self.state.lock();
            state.count = state.count.saturating_sub(1);
            if state.count > 0 {
                return;
            }
            let instance = state.instance.take();
            let created = std::mem::take(&mut state.created);
            instance.filter(|_| created)
        };
        debug!(component = self.configuration.name(), consumer = %consumer, "shared service released by last consumer");
        if let Some(instance) = release {
            self.build.dispose_component_instance(&self.configuration, &instance);
        }
    }
}
