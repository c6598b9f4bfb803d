//! Service registry port
//!
//! The registry publishes, ranks and hands out services. The engine only
//! consumes this contract; implementations live in the infrastructure layer.

use crate::error::Result;
use crate::value_objects::{
    ConsumerId, Filter, Properties, ServiceId, ServiceObject, ServiceReference,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of registry change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceEventKind {
    /// A service was registered
    Registered,
    /// Properties of a registered service changed
    Modified,
    /// A service is about to be unregistered; it is still queryable
    Unregistering,
}

/// Registry change notification
#[derive(Debug, Clone)]
pub struct ServiceEvent {
    /// What happened
    pub kind: ServiceEventKind,
    /// The affected service, with its current properties
    pub reference: ServiceReference,
}

impl ServiceEvent {
    /// Create an event
    pub fn new(kind: ServiceEventKind, reference: ServiceReference) -> Self {
        Self { kind, reference }
    }
}

/// Receives registry events synchronously on the delivering thread
pub trait ServiceListener: Send + Sync {
    /// Handle one event
    fn service_changed(&self, event: &ServiceEvent);
}

/// Produces service objects per consumer
pub trait ServiceFactory: Send + Sync {
    /// Called on the first acquisition by `consumer`
    fn get_service(&self, consumer: &ConsumerId, reference: &ServiceReference)
    -> Option<ServiceObject>;

    /// Called when `consumer` releases its last acquisition
    fn unget_service(
        &self,
        consumer: &ConsumerId,
        reference: &ServiceReference,
        service: &ServiceObject,
    );
}

/// What the registry hands out for a registration
#[derive(Clone)]
pub enum ServiceSource {
    /// The same object for every consumer
    Object(ServiceObject),
    /// Objects produced on demand
    Factory(Arc<dyn ServiceFactory>),
}

impl std::fmt::Debug for ServiceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object(_) => f.write_str("ServiceSource::Object"),
            Self::Factory(_) => f.write_str("ServiceSource::Factory"),
        }
    }
}

/// Handle returned when subscribing a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Service registry contract
pub trait ServiceRegistry: Send + Sync {
    /// Services registered under `interface` matching `filter`, highest ranked first
    fn query(&self, interface: &str, filter: Option<&Filter>) -> Vec<ServiceReference>;

    /// Current reference for a service id
    fn reference(&self, id: ServiceId) -> Option<ServiceReference>;

    /// Acquire the service object on behalf of `consumer`
    fn acquire(&self, reference: &ServiceReference, consumer: &ConsumerId) -> Option<ServiceObject>;

    /// Release one acquisition; returns false if `consumer` held none
    fn release(&self, reference: &ServiceReference, consumer: &ConsumerId) -> bool;

    /// Publish a service
    fn register(
        &self,
        owner: &ConsumerId,
        interfaces: &[String],
        source: ServiceSource,
        properties: Properties,
    ) -> Result<ServiceReference>;

    /// Replace the properties of a registered service
    fn set_properties(&self, id: ServiceId, properties: Properties) -> Result<()>;

    /// Withdraw a service; fails if it is not registered
    fn unregister(&self, id: ServiceId) -> Result<()>;

    /// True if `owner` may register services under `interface`
    fn has_register_permission(&self, _owner: &ConsumerId, _interface: &str) -> bool {
        true
    }

    /// Subscribe to registry events
    fn add_service_listener(&self, listener: Arc<dyn ServiceListener>) -> ListenerId;

    /// Unsubscribe a listener
    fn remove_service_listener(&self, id: ListenerId);
}
