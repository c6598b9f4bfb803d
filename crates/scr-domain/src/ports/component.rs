//! Component implementation ports
//!
//! User code plugs into the engine through these traits. Every callback
//! returns `anyhow::Result` so implementations can surface any failure; the
//! engine logs the cause and isolates it to the unit of work that raised it.

use crate::value_objects::{ConfigurationId, ConsumerId, Properties, ServiceObject, ServiceReference};

/// Provider handed to a bind or unbind method
#[derive(Debug, Clone)]
pub struct Binding {
    /// Name of the reference being bound
    pub reference: String,
    /// Provider handle
    pub provider: ServiceReference,
    /// Service object; `None` when the method takes the provider handle only
    pub service: Option<ServiceObject>,
}

impl Binding {
    /// Downcast the bound service object
    pub fn service<T: std::any::Any + Send + Sync>(&self) -> Option<std::sync::Arc<T>> {
        self.service
            .as_ref()
            .and_then(crate::value_objects::downcast_service::<T>)
    }
}

/// Activation context of one component instance
pub trait ComponentContext: Send + Sync {
    /// Merged configuration properties
    fn properties(&self) -> &Properties;

    /// Runtime id of the owning configuration
    fn component_id(&self) -> ConfigurationId;

    /// Consumer this instance was built for (per-consumer service factories)
    fn using_consumer(&self) -> Option<&ConsumerId>;

    /// Best matching service for a declared reference
    fn locate_service(&self, reference: &str) -> Option<ServiceObject>;

    /// All matching services for a declared reference, highest ranked first
    fn locate_services(&self, reference: &str) -> Vec<ServiceObject>;
}

/// One implementation object managed by the engine
pub trait Component: Send {
    /// Activate callback
    fn activate(&mut self, _context: &dyn ComponentContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Deactivate callback
    fn deactivate(&mut self, _context: &dyn ComponentContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoke the named bind method
    fn bind(&mut self, method: &str, _binding: &Binding) -> anyhow::Result<()> {
        anyhow::bail!("component has no bind method {method}")
    }

    /// Invoke the named unbind method
    fn unbind(&mut self, method: &str, _binding: &Binding) -> anyhow::Result<()> {
        anyhow::bail!("component has no unbind method {method}")
    }

    /// Object published when the component provides a service
    fn service(&self) -> Option<ServiceObject> {
        None
    }
}

/// Creates implementation instances for a description
pub trait ComponentFactory: Send + Sync {
    /// Instantiate a new implementation object
    fn instantiate(&self, properties: &Properties) -> anyhow::Result<Box<dyn Component>>;
}

impl<F> ComponentFactory for F
where
    F: Fn(&Properties) -> anyhow::Result<Box<dyn Component>> + Send + Sync,
{
    fn instantiate(&self, properties: &Properties) -> anyhow::Result<Box<dyn Component>> {
        self(properties)
    }
}
