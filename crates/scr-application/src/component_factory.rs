//! Component factories
//!
//! A description declaring a factory identifier is not built when satisfied.
//! Instead a [`ComponentFactoryService`] is registered under
//! [`COMPONENT_FACTORY_SERVICE`](scr_domain::constants::COMPONENT_FACTORY_SERVICE);
//! each `new_instance` call creates, enables and activates one more
//! configuration of the description.

use crate::configuration::{ComponentConfiguration, ComponentInstance};
use crate::resolver::Resolver;
use scr_domain::error::{Error, Result};
use scr_domain::{ConfigurationId, Properties, ServiceObject};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Service registered for a satisfied component factory description
pub struct ComponentFactoryService {
    factory: Arc<ComponentConfiguration>,
    resolver: Weak<Resolver>,
}

impl ComponentFactoryService {
    pub(crate) fn new(factory: Arc<ComponentConfiguration>, resolver: Weak<Resolver>) -> Self {
        Self { factory, resolver }
    }

    /// Factory identifier
    pub fn factory_id(&self) -> &str {
        self.factory.description().factory.as_deref().unwrap_or_default()
    }

    /// Name of the component this factory creates
    pub fn component_name(&self) -> &str {
        self.factory.name()
    }

    /// Create and activate a new configuration with `properties` overlaid on
    /// the factory's own properties
    pub fn new_instance(&self, properties: Properties) -> Result<ComponentInstanceHandle> {
        let resolver = self
            .resolver
            .upgrade()
            .ok_or_else(|| Error::disposed("service component runtime"))?;
        resolver.new_factory_instance(&self.factory, properties)
    }
}

impl std::fmt::Debug for ComponentFactoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactoryService")
            .field("factory", &self.factory_id())
            .field("component", &self.component_name())
            .finish()
    }
}

/// Handle to one instance created through a component factory
pub struct ComponentInstanceHandle {
    configuration: Arc<ComponentConfiguration>,
    instance: Arc<ComponentInstance>,
    resolver: Weak<Resolver>,
    disposed: AtomicBool,
}

impl ComponentInstanceHandle {
    pub(crate) fn new(
        configuration: Arc<ComponentConfiguration>,
        instance: Arc<ComponentInstance>,
        resolver: Weak<Resolver>,
    ) -> Self {
        Self {
            configuration,
            instance,
            resolver,
            disposed: AtomicBool::new(false),
        }
    }

    /// Id of the configuration backing this instance
    pub fn configuration_id(&self) -> ConfigurationId {
        self.configuration.id()
    }

    /// Merged properties of the instance
    pub fn properties(&self) -> &Properties {
        self.configuration.properties()
    }

    /// The activated instance
    pub fn instance(&self) -> &Arc<ComponentInstance> {
        &self.instance
    }

    /// Service object exposed by the instance
    pub fn service(&self) -> Option<ServiceObject> {
        self.instance.service()
    }

    /// True once disposed through this handle or by the runtime
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst) || !self.configuration.is_active()
    }

    /// Deactivate and remove the instance's configuration
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(resolver) = self.resolver.upgrade() {
            resolver.remove_configuration(self.configuration.id());
        }
    }
}

impl std::fmt::Debug for ComponentInstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstanceHandle")
            .field("configuration", &self.configuration.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
