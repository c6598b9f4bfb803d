//! Value objects of the component model

pub mod component;
pub mod filter;
pub mod properties;
pub mod service;

pub use component::{
    BindParameter, Cardinality, ComponentDescription, ConfigurationPolicy, ReferenceDescription,
    ReferencePolicy, ServiceDescription,
};
pub use filter::{Filter, FilterNode};
pub use properties::Properties;
pub use service::{
    ConfigurationId, ConsumerId, ServiceId, ServiceObject, ServiceReference, downcast_service,
    service_object, sort_by_ranking,
};
