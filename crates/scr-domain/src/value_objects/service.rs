//! Service identity value objects

use crate::value_objects::{Filter, Properties};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Type-erased service object handed out by the registry
pub type ServiceObject = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a service object
pub fn service_object<T: Any + Send + Sync>(value: T) -> ServiceObject {
    Arc::new(value)
}

/// Recover the concrete type of a service object
pub fn downcast_service<T: Any + Send + Sync>(object: &ServiceObject) -> Option<Arc<T>> {
    Arc::clone(object).downcast::<T>().ok()
}

/// Registry-assigned, stable service identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime identifier of one component configuration (`component.id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationId(pub u64);

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the code acquiring services (the "using bundle")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumerId(String);

impl ConsumerId {
    /// Create a consumer identity
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Consumer name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConsumerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Handle to one registered service and a snapshot of its properties
#[derive(Debug, Clone)]
pub struct ServiceReference {
    id: ServiceId,
    properties: Properties,
}

impl ServiceReference {
    /// Create a reference; `properties` must already carry `objectClass`
    pub fn new(id: ServiceId, properties: Properties) -> Self {
        Self { id, properties }
    }

    /// Service id
    pub fn id(&self) -> ServiceId {
        self.id
    }

    /// Service properties
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Service ranking
    pub fn ranking(&self) -> i64 {
        self.properties.ranking()
    }

    /// Registered interfaces
    pub fn interfaces(&self) -> Vec<String> {
        self.properties.object_class()
    }

    /// True if registered under `interface`
    pub fn implements(&self, interface: &str) -> bool {
        self.properties.implements(interface)
    }

    /// True if the properties satisfy `filter`
    pub fn matches(&self, filter: &Filter) -> bool {
        filter.matches(&self.properties)
    }

    /// The component configuration providing this service, if any
    pub fn component(&self) -> Option<ConfigurationId> {
        self.properties.component_id().map(ConfigurationId)
    }

    /// Highest-ranked-wins order: ranking descending, then id ascending
    pub fn rank_order(a: &Self, b: &Self) -> Ordering {
        b.ranking().cmp(&a.ranking()).then(a.id.cmp(&b.id))
    }
}

impl PartialEq for ServiceReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceReference {}

/// Sort candidates into highest-ranked-wins order
pub fn sort_by_ranking(candidates: &mut [ServiceReference]) {
    candidates.sort_by(ServiceReference::rank_order);
}
