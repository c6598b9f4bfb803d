//! In-memory service registry
//!
//! Process-local implementation of the service registry port for embedding
//! the runtime without an external framework, and for tests. Listeners and
//! service factories are always called with the internal lock released, so
//! they may call back into the registry.

use parking_lot::Mutex;
use scr_domain::constants::{DEFAULT_SERVICE_RANKING, OBJECT_CLASS, SERVICE_ID, SERVICE_RANKING};
use scr_domain::error::{Error, Result};
use scr_domain::ports::{
    ListenerId, ServiceEvent, ServiceEventKind, ServiceFactory, ServiceListener, ServiceRegistry,
    ServiceSource,
};
use scr_domain::{
    ConsumerId, Filter, Properties, ServiceId, ServiceObject, ServiceReference, sort_by_ranking,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

struct Usage {
    count: usize,
    object: ServiceObject,
}

struct Registration {
    owner: ConsumerId,
    properties: Properties,
    source: ServiceSource,
    usage: HashMap<ConsumerId, Usage>,
    unregistering: bool,
}

impl Registration {
    fn reference(&self, id: ServiceId) -> ServiceReference {
        ServiceReference::new(id, self.properties.clone())
    }

    fn factory(&self) -> Option<Arc<dyn ServiceFactory>> {
        match &self.source {
            ServiceSource::Factory(factory) => Some(Arc::clone(factory)),
            ServiceSource::Object(_) => None,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    services: BTreeMap<ServiceId, Registration>,
    listeners: BTreeMap<ListenerId, Arc<dyn ServiceListener>>,
    denied: HashSet<String>,
}

impl RegistryState {
    fn listeners(&self) -> Vec<Arc<dyn ServiceListener>> {
        self.listeners.values().cloned().collect()
    }
}

/// Process-local service registry
pub struct InMemoryServiceRegistry {
    state: Mutex<RegistryState>,
    next_service: AtomicU64,
    next_listener: AtomicU64,
}

impl InMemoryServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            next_service: AtomicU64::new(1),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Refuse registrations under `interface`
    pub fn deny_register_permission(&self, interface: impl Into<String>) {
        self.state.lock().denied.insert(interface.into());
    }

    /// Allow registrations under `interface` again
    pub fn allow_register_permission(&self, interface: &str) {
        self.state.lock().denied.remove(interface);
    }

    /// Number of registered services
    pub fn service_count(&self) -> usize {
        self.state.lock().services.len()
    }

    /// Acquisitions of service `id` currently held by `consumer`
    pub fn usage_count(&self, id: ServiceId, consumer: &ConsumerId) -> usize {
        self.state
            .lock()
            .services
            .get(&id)
            .and_then(|r| r.usage.get(consumer))
            .map_or(0, |u| u.count)
    }

    /// Consumer that registered service `id`
    pub fn owner(&self, id: ServiceId) -> Option<ConsumerId> {
        self.state.lock().services.get(&id).map(|r| r.owner.clone())
    }

    fn notify(listeners: &[Arc<dyn ServiceListener>], event: &ServiceEvent) {
        trace!(kind = ?event.kind, service_id = %event.reference.id(), listeners = listeners.len(), "delivering service event");
        for listener in listeners {
            listener.service_changed(event);
        }
    }

    /// Registry-managed properties override whatever the provider supplied
    fn service_properties(id: ServiceId, interfaces: &[String], mut properties: Properties) -> Properties {
        properties.insert(
            OBJECT_CLASS,
            Value::Array(interfaces.iter().cloned().map(Value::String).collect()),
        );
        properties.insert(SERVICE_ID, id.0);
        if !properties.contains_key(SERVICE_RANKING) {
            properties.insert(SERVICE_RANKING, DEFAULT_SERVICE_RANKING);
        }
        properties
    }
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn query(&self, interface: &str, filter: Option<&Filter>) -> Vec<ServiceReference> {
        let state = self.state.lock();
        let mut matches: Vec<ServiceReference> = state
            .services
            .iter()
            .filter(|(_, r)| r.properties.implements(interface))
            .filter(|(_, r)| filter.is_none_or(|f| f.matches(&r.properties)))
            .map(|(id, r)| r.reference(*id))
            .collect();
        drop(state);
        sort_by_ranking(&mut matches);
        matches
    }

    fn reference(&self, id: ServiceId) -> Option<ServiceReference> {
        self.state.lock().services.get(&id).map(|r| r.reference(id))
    }

    fn acquire(&self, reference: &ServiceReference, consumer: &ConsumerId) -> Option<ServiceObject> {
        let id = reference.id();
        let factory = {
            let mut state = self.state.lock();
            let registration = state.services.get_mut(&id)?;
            if let Some(usage) = registration.usage.get_mut(consumer) {
                usage.count += 1;
                return Some(Arc::clone(&usage.object));
            }
            match &registration.source {
                ServiceSource::Object(object) => {
                    let object = Arc::clone(object);
                    registration.usage.insert(
                        consumer.clone(),
                        Usage { count: 1, object: Arc::clone(&object) },
                    );
                    return Some(object);
                }
                ServiceSource::Factory(factory) => Arc::clone(factory),
            }
        };

        let current = self.reference(id)?;
        let object = factory.get_service(consumer, &current)?;

        let mut state = self.state.lock();
        let Some(registration) = state.services.get_mut(&id) else {
            drop(state);
            debug!(service_id = %id, consumer = %consumer, "service unregistered during acquisition");
            factory.unget_service(consumer, &current, &object);
            return None;
        };
        if let Some(usage) = registration.usage.get_mut(consumer) {
            // Raced with another acquisition by the same consumer
            usage.count += 1;
            let existing = Arc::clone(&usage.object);
            drop(state);
            factory.unget_service(consumer, &current, &object);
            return Some(existing);
        }
        registration.usage.insert(
            consumer.clone(),
            Usage { count: 1, object: Arc::clone(&object) },
        );
        Some(object)
    }

    fn release(&self, reference: &ServiceReference, consumer: &ConsumerId) -> bool {
        let id = reference.id();
        let released = {
            let mut state = self.state.lock();
            let Some(registration) = state.services.get_mut(&id) else {
                return false;
            };
            let Some(usage) = registration.usage.get_mut(consumer) else {
                return false;
            };
            usage.count -= 1;
            if usage.count > 0 {
                return true;
            }
            let factory = registration.factory();
            let current = registration.reference(id);
            registration
                .usage
                .remove(consumer)
                .and_then(|usage| factory.map(|f| (f, current, usage.object)))
        };
        if let Some((factory, current, object)) = released {
            factory.unget_service(consumer, &current, &object);
        }
        true
    }

    fn register(
        &self,
        owner: &ConsumerId,
        interfaces: &[String],
        source: ServiceSource,
        properties: Properties,
    ) -> Result<ServiceReference> {
        if interfaces.is_empty() {
            return Err(Error::registry("a service needs at least one interface"));
        }
        let (reference, listeners) = {
            let mut state = self.state.lock();
            if let Some(denied) = interfaces.iter().find(|i| state.denied.contains(i.as_str())) {
                return Err(Error::registry(format!(
                    "{owner} has no permission to register {denied}"
                )));
            }
            let id = ServiceId(self.next_service.fetch_add(1, Ordering::SeqCst));
            let registration = Registration {
                owner: owner.clone(),
                properties: Self::service_properties(id, interfaces, properties),
                source,
                usage: HashMap::new(),
                unregistering: false,
            };
            let reference = registration.reference(id);
            state.services.insert(id, registration);
            (reference, state.listeners())
        };

        debug!(service_id = %reference.id(), owner = %owner, interfaces = ?interfaces, "service registered");
        Self::notify(
            &listeners,
            &ServiceEvent::new(ServiceEventKind::Registered, reference.clone()),
        );
        Ok(reference)
    }

    fn set_properties(&self, id: ServiceId, properties: Properties) -> Result<()> {
        let (reference, listeners) = {
            let mut state = self.state.lock();
            let Some(registration) = state.services.get_mut(&id) else {
                return Err(Error::registry(format!("service {id} is not registered")));
            };
            let interfaces = registration.properties.object_class();
            registration.properties = Self::service_properties(id, &interfaces, properties);
            let reference = registration.reference(id);
            (reference, state.listeners())
        };
        Self::notify(
            &listeners,
            &ServiceEvent::new(ServiceEventKind::Modified, reference),
        );
        Ok(())
    }

    fn unregister(&self, id: ServiceId) -> Result<()> {
        let (reference, listeners) = {
            let mut state = self.state.lock();
            let Some(registration) = state.services.get_mut(&id) else {
                return Err(Error::registry(format!("service {id} is already unregistered")));
            };
            if registration.unregistering {
                return Err(Error::registry(format!("service {id} is already unregistering")));
            }
            registration.unregistering = true;
            let reference = registration.reference(id);
            (reference, state.listeners())
        };

        // Still queryable while listeners react
        Self::notify(
            &listeners,
            &ServiceEvent::new(ServiceEventKind::Unregistering, reference),
        );

        let Some(registration) = self.state.lock().services.remove(&id) else {
            return Ok(());
        };
        if let Some(factory) = registration.factory() {
            let current = registration.reference(id);
            for (consumer, usage) in &registration.usage {
                factory.unget_service(consumer, &current, &usage.object);
            }
        }
        debug!(service_id = %id, "service unregistered");
        Ok(())
    }

    fn has_register_permission(&self, _owner: &ConsumerId, interface: &str) -> bool {
        !self.state.lock().denied.contains(interface)
    }

    fn add_service_listener(&self, listener: Arc<dyn ServiceListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.state.lock().listeners.insert(id, listener);
        id
    }

    fn remove_service_listener(&self, id: ListenerId) {
        self.state.lock().listeners.remove(&id);
    }
}
