//! Build/Dispose engine
//!
//! Instantiates, binds, activates, deactivates, unbinds and releases
//! component instances. All of it runs under one reentrant lock so build and
//! dispose are serialized against each other while a build that transitively
//! builds its providers on the same thread can proceed.
//!
//! ## Reentrancy guard
//!
//! `stack_count` tracks the depth of nested builds. While it is non-zero a
//! service acquisition that could re-enter a producer noted by cycle breaking
//! is refused; dynamic references refused this way are parked and flushed as
//! one DYNAMICBIND job once the outermost build returns.

use crate::configuration::{ComponentConfiguration, ComponentInstance, Lifecycle, guarded};
use crate::events::ComponentEventBus;
use crate::reference::Reference;
use crate::work_queue::{WorkAction, WorkDispatcher, WorkQueue};
use parking_lot::ReentrantMutex;
use scr_domain::error::{Error, Result};
use scr_domain::ports::{Binding, ServiceRegistry};
use scr_domain::{ComponentEvent, ConfigurationId, ConsumerId, ServiceId, ServiceReference};
use std::cell::RefCell;
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

/// Read access to enabled configurations by id
pub trait ConfigurationLookup: Send + Sync {
    /// Enabled configuration with this id
    fn configuration(&self, id: ConfigurationId) -> Option<Arc<ComponentConfiguration>>;

    /// True if the configuration is currently satisfied
    fn is_satisfied(&self, id: ConfigurationId) -> bool;

    /// True if the service was announced as unregistering
    fn is_departing(&self, _id: ServiceId) -> bool {
        false
    }
}

/// Whether a configuration teardown is final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeReason {
    /// Dependencies went away; the configuration can be rebuilt later
    Unsatisfied,
    /// Disabled, deleted or removed; the configuration is gone
    Removed,
}

struct BuildState {
    lifecycle: Lifecycle,
    stack_count: usize,
    delayed_binds: Vec<Arc<Reference>>,
}

/// Build/Dispose engine
pub struct BuildDispose {
    registry: Arc<dyn ServiceRegistry>,
    events: ComponentEventBus,
    queue: WorkQueue,
    dispatcher: Weak<dyn WorkDispatcher>,
    lookup: Weak<dyn ConfigurationLookup>,
    state: ReentrantMutex<RefCell<BuildState>>,
}

impl BuildDispose {
    /// Create the engine
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        events: ComponentEventBus,
        queue: WorkQueue,
        dispatcher: Weak<dyn WorkDispatcher>,
        lookup: Weak<dyn ConfigurationLookup>,
    ) -> Self {
        Self {
            registry,
            events,
            queue,
            dispatcher,
            lookup,
            state: ReentrantMutex::new(RefCell::new(BuildState {
                lifecycle: Lifecycle::Active,
                stack_count: 0,
                delayed_binds: Vec::new(),
            })),
        }
    }

    /// Service registry used for every acquisition
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// Run `f` serialized against every other build and dispose
    pub fn serialized<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.state.lock();
        f()
    }

    /// Refuse all further builds
    pub fn shutdown(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.lifecycle = Lifecycle::Disposed;
        state.delayed_binds.clear();
    }

    /// Current build depth
    pub fn stack_count(&self) -> usize {
        self.state.lock().borrow().stack_count
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build, bind and activate one instance of `configuration`
    ///
    /// `consumer` is set when building for one consumer of a per-consumer
    /// service factory.
    pub fn build_component_config_instance(
        &self,
        consumer: Option<&ConsumerId>,
        configuration: &Arc<ComponentConfiguration>,
    ) -> Result<Arc<ComponentInstance>> {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            if state.lifecycle == Lifecycle::Disposed {
                return Err(Error::disposed("build engine"));
            }
            state.stack_count += 1;
        }

        let result = self.build_instance(consumer, configuration);

        let flush = {
            let mut state = guard.borrow_mut();
            state.stack_count -= 1;
            if state.stack_count == 0 {
                std::mem::take(&mut state.delayed_binds)
            } else {
                Vec::new()
            }
        };
        drop(guard);

        if !flush.is_empty() {
            self.flush_delayed_binds(flush);
        }
        result
    }

    fn build_instance(
        &self,
        consumer: Option<&ConsumerId>,
        configuration: &Arc<ComponentConfiguration>,
    ) -> Result<Arc<ComponentInstance>> {
        let name = configuration.name().to_string();
        let id = configuration.id();
        if !configuration.is_active() {
            return Err(Error::disposed(format!("component configuration {name} ({id})")));
        }

        let description = configuration.description();
        let component = match guarded("instantiate", || description.implementation.instantiate(configuration.properties())) {
            Ok(component) => component,
            Err(cause) => {
                error!(component = %name, component_id = %id, error = %cause, "instantiation failed");
                self.publish_failure(&name, id, &cause);
                return Err(Error::build_with_source(name, "instantiation failed", cause));
            }
        };

        let instance = Arc::new(ComponentInstance::new(
            configuration,
            component,
            consumer.cloned(),
            Arc::clone(&self.registry),
        ));

        for reference in configuration.references() {
            if reference.bind_method().is_none() {
                continue;
            }
            let bound = reference.bound();
            if bound.is_empty() {
                self.bind_reference(configuration, reference, std::slice::from_ref(&instance), None);
            } else {
                for provider in bound {
                    self.invoke_bind(configuration, reference, &instance, &provider);
                }
            }
        }

        if description.activate.is_some()
            && let Err(cause) = instance.activate()
        {
            error!(component = %name, component_id = %id, error = %cause, "activate failed");
            self.publish_failure(&name, id, &cause);
            instance.release_located();
            if configuration.instance_count() == 0 {
                self.release_references(configuration);
            }
            return Err(Error::build_with_source(name, "activate failed", cause));
        }

        configuration.add_instance(Arc::clone(&instance));
        debug!(component = %name, component_id = %id, consumer = ?consumer, "component activated");
        self.events.publish(ComponentEvent::Activated { name, id });
        Ok(instance)
    }

    fn publish_failure(&self, name: &str, id: ConfigurationId, cause: &anyhow::Error) {
        self.events.publish(ComponentEvent::ActivationFailed {
            name: name.to_string(),
            id,
            reason: format!("{cause:#}"),
        });
    }

    fn flush_delayed_binds(&self, references: Vec<Arc<Reference>>) {
        let Some(dispatcher) = self.dispatcher.upgrade() else {
            return;
        };
        debug!(references = references.len(), "flushing delayed binds");
        if let Err(e) = self.queue.enqueue(dispatcher, WorkAction::DynamicBind(references)) {
            warn!(error = %e, "could not queue delayed binds");
        }
    }

    // ========================================================================
    // Bind
    // ========================================================================

    /// Select providers for `reference` and bind them on `instances`
    ///
    /// `departing` is excluded from the candidates and does not count
    /// against the cardinality; it is being unbound by the caller. Returns
    /// the number of newly bound providers.
    pub fn bind_reference(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Arc<Reference>,
        instances: &[Arc<ComponentInstance>],
        departing: Option<ServiceId>,
    ) -> usize {
        let _guard = self.state.lock();
        let occupied = reference
            .bound()
            .iter()
            .filter(|r| Some(r.id()) != departing)
            .count();
        let capacity = reference.max().saturating_sub(occupied);
        if capacity == 0 {
            return 0;
        }

        let lookup = self.lookup.upgrade();
        let candidates: Vec<ServiceReference> = reference
            .providers(self.registry.as_ref())
            .into_iter()
            .filter(|c| Some(c.id()) != departing && !reference.is_bound(c.id()))
            .filter(|c| !lookup.as_ref().is_some_and(|l| l.is_departing(c.id())))
            .take(capacity)
            .collect();

        if candidates.is_empty() && occupied == 0 && reference.is_required() {
            warn!(
                component = configuration.name(),
                component_id = %configuration.id(),
                reference = reference.name(),
                "no provider for required reference"
            );
        }

        candidates
            .into_iter()
            .filter(|candidate| self.bind_service_to_reference(configuration, reference, instances, candidate))
            .count()
    }

    fn bind_service_to_reference(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Arc<Reference>,
        instances: &[Arc<ComponentInstance>],
        provider: &ServiceReference,
    ) -> bool {
        if reference.is_bound(provider.id()) {
            return false;
        }

        let service = if reference.takes_reference() {
            None
        } else {
            if self.could_cause_cycle(configuration, provider) {
                debug!(
                    component = configuration.name(),
                    reference = reference.name(),
                    service_id = %provider.id(),
                    "deferring bind to avoid re-entering a delayed producer"
                );
                if reference.is_dynamic() && reference.bind_method().is_some() {
                    self.state.lock().borrow_mut().delayed_binds.push(Arc::clone(reference));
                }
                return false;
            }
            match self.registry.acquire(provider, configuration.owner()) {
                Some(service) => Some(service),
                None => {
                    warn!(
                        component = configuration.name(),
                        reference = reference.name(),
                        service_id = %provider.id(),
                        "provider returned no service object"
                    );
                    return false;
                }
            }
        };

        if !reference.add_bound(provider.clone(), service) {
            // Bound concurrently; give back the extra acquisition.
            if !reference.takes_reference() {
                self.registry.release(provider, configuration.owner());
            }
            return false;
        }
        for instance in instances {
            self.invoke_bind(configuration, reference, instance, provider);
        }
        true
    }

    fn invoke_bind(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Reference,
        instance: &ComponentInstance,
        provider: &ServiceReference,
    ) {
        let Some(method) = reference.bind_method() else {
            return;
        };
        let binding = Binding {
            reference: reference.name().to_string(),
            provider: provider.clone(),
            service: reference.cached_service(provider.id()),
        };
        if let Err(cause) = instance.bind(method, &binding) {
            let e = Error::lifecycle(format!("bind method {method} failed"), cause);
            warn!(
                component = configuration.name(),
                reference = reference.name(),
                service_id = %provider.id(),
                error = %e,
                "bind failed; continuing"
            );
        }
    }

    /// True if acquiring `provider` now could re-enter a producer that cycle
    /// breaking told `consumer` not to activate eagerly
    fn could_cause_cycle(&self, consumer: &ComponentConfiguration, provider: &ServiceReference) -> bool {
        if self.stack_count() == 0 {
            return false;
        }
        let Some(producer_id) = provider.component() else {
            return false;
        };
        if !consumer.has_delay_note(producer_id) {
            return false;
        }
        let Some(producer) = self.lookup.upgrade().and_then(|l| l.configuration(producer_id)) else {
            return false;
        };
        if producer.description().is_service_factory() {
            !producer.has_instance_for(consumer.owner())
        } else {
            producer.instance_count() == 0
        }
    }

    // ========================================================================
    // Unbind
    // ========================================================================

    /// Replace then unbind a departing provider of a dynamic reference
    ///
    /// A replacement is bound before the departing provider is dropped, so the
    /// reference is never transiently empty while another match exists.
    pub fn unbind_dynamic_reference(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Arc<Reference>,
        departing: &ServiceReference,
    ) {
        let _guard = self.state.lock();
        let instances = configuration.instances();
        if !instances.is_empty() {
            self.bind_reference(configuration, reference, &instances, Some(departing.id()));
        }
        self.unbind_service_from_reference(configuration, reference, &instances, departing.id());
    }

    fn unbind_service_from_reference(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Reference,
        instances: &[Arc<ComponentInstance>],
        id: ServiceId,
    ) {
        if !reference.is_bound(id) {
            return;
        }
        if let Some(method) = reference.unbind_method() {
            for instance in instances {
                self.invoke_unbind(configuration, reference, instance, method, id);
            }
        }
        if let Some(unbound) = reference.remove_bound(id)
            && unbound.service.is_some()
        {
            self.registry.release(&unbound.provider, configuration.owner());
        }
    }

    fn invoke_unbind(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Reference,
        instance: &ComponentInstance,
        method: &str,
        id: ServiceId,
    ) {
        let Some(provider) = reference.bound().into_iter().find(|r| r.id() == id) else {
            return;
        };
        let binding = Binding {
            reference: reference.name().to_string(),
            service: reference.cached_service(id),
            provider,
        };
        if let Err(cause) = instance.unbind(method, &binding) {
            let e = Error::lifecycle(format!("unbind method {method} failed"), cause);
            warn!(
                component = configuration.name(),
                reference = reference.name(),
                service_id = %id,
                error = %e,
                "unbind failed; continuing"
            );
        }
    }

    // ========================================================================
    // Dispose
    // ========================================================================

    /// Deactivate one instance and unbind its references in reverse order
    pub fn dispose_component_instance(
        &self,
        configuration: &ComponentConfiguration,
        instance: &Arc<ComponentInstance>,
    ) {
        let _guard = self.state.lock();
        if !configuration.remove_instance(instance) {
            return;
        }
        let name = configuration.name().to_string();
        let id = configuration.id();

        if configuration.description().deactivate.is_some()
            && let Err(cause) = instance.deactivate()
        {
            let e = Error::lifecycle("deactivate failed", cause);
            warn!(component = %name, component_id = %id, error = %e, "deactivate failed; continuing");
        }

        for reference in configuration.references().iter().rev() {
            let Some(method) = reference.unbind_method() else {
                continue;
            };
            for provider in reference.bound().iter().rev() {
                self.invoke_unbind(configuration, reference, instance, method, provider.id());
            }
        }
        instance.release_located();

        debug!(component = %name, component_id = %id, "component deactivated");
        self.events.publish(ComponentEvent::Deactivated { name, id });

        if configuration.instance_count() == 0 {
            self.release_references(configuration);
        }
    }

    /// Tear down a whole configuration: unregister its service, dispose every
    /// instance and release every bound provider
    pub fn dispose_component_configuration(&self, configuration: &ComponentConfiguration, reason: DisposeReason) {
        let _guard = self.state.lock();
        let name = configuration.name().to_string();
        let id = configuration.id();

        if let Some(registration) = configuration.take_registration() {
            match self.registry.unregister(registration.id()) {
                Ok(()) => self.events.publish(ComponentEvent::ServiceUnregistered {
                    name: name.clone(),
                    id,
                    service_id: registration.id(),
                }),
                Err(e) => debug!(component = %name, service_id = %registration.id(), error = %e, "service already unregistered"),
            }
        }

        for instance in configuration.instances() {
            self.dispose_component_instance(configuration, &instance);
        }
        self.release_references(configuration);
        configuration.reset_publication();

        if reason == DisposeReason::Removed && configuration.dispose() {
            debug!(component = %name, component_id = %id, "component configuration disposed");
            self.events.publish(ComponentEvent::Disposed { name, id });
        }
    }

    /// Forget all binding state of `configuration`, releasing acquired services
    fn release_references(&self, configuration: &ComponentConfiguration) {
        for reference in configuration.references() {
            for unbound in reference.clear() {
                if unbound.service.is_some() {
                    self.registry.release(&unbound.provider, configuration.owner());
                }
            }
        }
    }
}
