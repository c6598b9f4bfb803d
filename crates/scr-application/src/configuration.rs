//! Component configurations and instances
//!
//! A [`ComponentConfiguration`] is one enabled instantiation of a description
//! bound to a concrete property set. It owns its references, the instances
//! built for it, the registration handle of its provided service and the
//! delay-activate notes written by cycle breaking.

use crate::reference::Reference;
use parking_lot::Mutex;
use scr_domain::constants::{COMPONENT_ID, COMPONENT_NAME, SERVICE_PID};
use scr_domain::error::Result;
use scr_domain::ports::{Binding, Component, ComponentContext, ServiceRegistry};
use scr_domain::{
    ComponentDescription, ConfigurationId, ConsumerId, Properties, ServiceObject,
    ServiceReference,
};
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Teardown state checked at every entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting work
    Active,
    /// Torn down; further work is refused
    Disposed,
}

struct ConfigurationState {
    lifecycle: Lifecycle,
    /// Set once BUILD processed this configuration; reset by teardown
    published: bool,
    instances: Vec<Arc<ComponentInstance>>,
    registration: Option<ServiceReference>,
    delay_notes: BTreeSet<ConfigurationId>,
}

/// One runtime instantiation of a component description
pub struct ComponentConfiguration {
    id: ConfigurationId,
    description: Arc<ComponentDescription>,
    properties: Properties,
    pid: Option<String>,
    references: Vec<Arc<Reference>>,
    factory_instance: bool,
    state: Mutex<ConfigurationState>,
}

impl ComponentConfiguration {
    /// Materialize a configuration from declarative defaults overlaid with
    /// `data` (configuration store) and `extra` (component factory arguments)
    pub fn new(
        id: ConfigurationId,
        description: Arc<ComponentDescription>,
        data: Option<&Properties>,
        extra: Option<&Properties>,
        factory_instance: bool,
    ) -> Result<Self> {
        let mut properties = description.properties.clone();
        if let Some(data) = data {
            properties.merge(data);
        }
        if let Some(extra) = extra {
            properties.merge(extra);
        }
        properties.insert(COMPONENT_NAME, description.name.clone());
        properties.insert(COMPONENT_ID, id.0);

        let pid = data.and_then(|d| d.string(SERVICE_PID)).map(str::to_string);
        let references = description
            .references
            .iter()
            .map(|r| Reference::new(r.clone(), id, &properties).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            description,
            properties,
            pid,
            references,
            factory_instance,
            state: Mutex::new(ConfigurationState {
                lifecycle: Lifecycle::Active,
                published: false,
                instances: Vec::new(),
                registration: None,
                delay_notes: BTreeSet::new(),
            }),
        })
    }

    /// Runtime id
    pub fn id(&self) -> ConfigurationId {
        self.id
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Backing description
    pub fn description(&self) -> &Arc<ComponentDescription> {
        &self.description
    }

    /// Merged properties
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// PID of the backing configuration data, if any
    pub fn pid(&self) -> Option<&str> {
        self.pid.as_deref()
    }

    /// Identity used to acquire services
    pub fn owner(&self) -> &ConsumerId {
        &self.description.owner
    }

    /// References in declaration order
    pub fn references(&self) -> &[Arc<Reference>] {
        &self.references
    }

    /// Reference by name
    pub fn reference(&self, name: &str) -> Option<&Arc<Reference>> {
        self.references.iter().find(|r| r.name() == name)
    }

    /// True if created through a component factory
    pub fn is_factory_instance(&self) -> bool {
        self.factory_instance
    }

    /// Interfaces of the provided service
    pub fn provided_interfaces(&self) -> &[String] {
        self.description
            .service
            .as_ref()
            .map_or(&[][..], |service| service.interfaces.as_slice())
    }

    /// Properties published with the provided service
    pub fn service_properties(&self) -> Properties {
        self.properties.public()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// True until the configuration is disposed
    pub fn is_active(&self) -> bool {
        self.state.lock().lifecycle == Lifecycle::Active
    }

    /// Mark disposed and drop the delay notes; false if already disposed
    pub(crate) fn dispose(&self) -> bool {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Disposed {
            return false;
        }
        state.lifecycle = Lifecycle::Disposed;
        state.delay_notes.clear();
        true
    }

    /// Claim the right to publish this configuration; at most once per teardown
    pub(crate) fn claim_publication(&self) -> bool {
        let mut state = self.state.lock();
        if state.lifecycle != Lifecycle::Active || state.published {
            return false;
        }
        state.published = true;
        true
    }

    pub(crate) fn reset_publication(&self) {
        self.state.lock().published = false;
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    /// Snapshot of the created instances
    pub fn instances(&self) -> Vec<Arc<ComponentInstance>> {
        self.state.lock().instances.clone()
    }

    /// Number of created instances
    pub fn instance_count(&self) -> usize {
        self.state.lock().instances.len()
    }

    /// True if an instance was built for `consumer`
    pub fn has_instance_for(&self, consumer: &ConsumerId) -> bool {
        self.state
            .lock()
            .instances
            .iter()
            .any(|i| i.consumer() == Some(consumer))
    }

    pub(crate) fn add_instance(&self, instance: Arc<ComponentInstance>) {
        self.state.lock().instances.push(instance);
    }

    pub(crate) fn remove_instance(&self, instance: &Arc<ComponentInstance>) -> bool {
        let mut state = self.state.lock();
        let before = state.instances.len();
        state.instances.retain(|i| !Arc::ptr_eq(i, instance));
        state.instances.len() != before
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Handle of the registered service, if any
    pub fn registration(&self) -> Option<ServiceReference> {
        self.state.lock().registration.clone()
    }

    pub(crate) fn set_registration(&self, reference: ServiceReference) {
        self.state.lock().registration = Some(reference);
    }

    pub(crate) fn take_registration(&self) -> Option<ServiceReference> {
        self.state.lock().registration.take()
    }

    // ------------------------------------------------------------------
    // Delay-activate notes
    // ------------------------------------------------------------------

    /// Producers this configuration must not eagerly activate
    pub fn delay_notes(&self) -> Vec<ConfigurationId> {
        self.state.lock().delay_notes.iter().copied().collect()
    }

    /// True if `producer` is noted
    pub fn has_delay_note(&self, producer: ConfigurationId) -> bool {
        self.state.lock().delay_notes.contains(&producer)
    }

    /// Note a producer; false if it was already noted
    pub(crate) fn add_delay_note(&self, producer: ConfigurationId) -> bool {
        self.state.lock().delay_notes.insert(producer)
    }
}

impl std::fmt::Debug for ComponentConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentConfiguration")
            .field("id", &self.id)
            .field("name", &self.description.name)
            .field("pid", &self.pid)
            .field("factory_instance", &self.factory_instance)
            .finish_non_exhaustive()
    }
}

/// One implementation object plus its activation context
pub struct ComponentInstance {
    component: Mutex<Box<dyn Component>>,
    context: InstanceContext,
}

impl ComponentInstance {
    pub(crate) fn new(
        configuration: &ComponentConfiguration,
        component: Box<dyn Component>,
        consumer: Option<ConsumerId>,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Self {
        Self {
            component: Mutex::new(component),
            context: InstanceContext {
                configuration: configuration.id(),
                properties: configuration.properties().clone(),
                consumer,
                owner: configuration.owner().clone(),
                references: configuration.references().to_vec(),
                registry,
                located: Mutex::new(Vec::new()),
            },
        }
    }

    /// Activation context
    pub fn context(&self) -> &dyn ComponentContext {
        &self.context
    }

    /// Consumer the instance was built for
    pub fn consumer(&self) -> Option<&ConsumerId> {
        self.context.consumer.as_ref()
    }

    /// Object exposed as the provided service
    pub fn service(&self) -> Option<ServiceObject> {
        match guarded("service", || Ok(self.component.lock().service())) {
            Ok(service) => service,
            Err(e) => {
                tracing::error!(component_id = %self.context.configuration, error = %e, "service lookup failed");
                None
            }
        }
    }

    /// Run `f` against the implementation object
    pub fn with_component<R>(&self, f: impl FnOnce(&mut dyn Component) -> R) -> R {
        let mut component = self.component.lock();
        f(&mut **component)
    }

    pub(crate) fn activate(&self) -> anyhow::Result<()> {
        guarded("activate", || self.component.lock().activate(&self.context))
    }

    pub(crate) fn deactivate(&self) -> anyhow::Result<()> {
        guarded("deactivate", || self.component.lock().deactivate(&self.context))
    }

    pub(crate) fn bind(&self, method: &str, binding: &Binding) -> anyhow::Result<()> {
        guarded(method, || self.component.lock().bind(method, binding))
    }

    pub(crate) fn unbind(&self, method: &str, binding: &Binding) -> anyhow::Result<()> {
        guarded(method, || self.component.lock().unbind(method, binding))
    }

    /// Release every service acquired through `locate_service`
    pub(crate) fn release_located(&self) {
        self.context.release_located();
    }
}

/// Run one user callback, turning a panic into an error
pub(crate) fn guarded<R>(callback: &str, f: impl FnOnce() -> anyhow::Result<R>) -> anyhow::Result<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!(
            "{callback} panicked: {}",
            crate::work_queue::panic_message(panic.as_ref())
        )),
    }
}

/// [`ComponentContext`] handed to user code
struct InstanceContext {
    configuration: ConfigurationId,
    properties: Properties,
    consumer: Option<ConsumerId>,
    owner: ConsumerId,
    references: Vec<Arc<Reference>>,
    registry: Arc<dyn ServiceRegistry>,
    located: Mutex<Vec<ServiceReference>>,
}

impl InstanceContext {
    fn locate(&self, reference: &str, limit: usize) -> Vec<ServiceObject> {
        let Some(reference) = self.references.iter().find(|r| r.name() == reference) else {
            tracing::warn!(
                component_id = %self.configuration,
                reference,
                "locate_service on an undeclared reference"
            );
            return Vec::new();
        };

        let mut located = Vec::new();
        for provider in reference.providers(self.registry.as_ref()) {
            if located.len() >= limit {
                break;
            }
            if let Some(service) = reference.cached_service(provider.id()) {
                located.push(service);
                continue;
            }
            if let Some(service) = self.registry.acquire(&provider, &self.owner) {
                self.located.lock().push(provider);
                located.push(service);
            }
        }
        located
    }

    fn release_located(&self) {
        let providers = std::mem::take(&mut *self.located.lock());
        for provider in providers {
            self.registry.release(&provider, &self.owner);
        }
    }
}

impl ComponentContext for InstanceContext {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn component_id(&self) -> ConfigurationId {
        self.configuration
    }

    fn using_consumer(&self) -> Option<&ConsumerId> {
        self.consumer.as_ref()
    }

    fn locate_service(&self, reference: &str) -> Option<ServiceObject> {
        self.locate(reference, 1).into_iter().next()
    }

    fn locate_services(&self, reference: &str) -> Vec<ServiceObject> {
        self.locate(reference, usize::MAX)
    }
}
