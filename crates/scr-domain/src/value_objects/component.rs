//! Component descriptions
//!
//! Immutable templates supplied by the component model loader. A description
//! names an implementation factory, its declared references, the service it
//! provides and how it is activated. The engine never parses descriptor
//! syntax; loaders build these values directly.

use crate::error::{Error, Result};
use crate::ports::component::ComponentFactory;
use crate::value_objects::{ConsumerId, Properties};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Minimum/maximum number of providers a reference binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cardinality {
    /// `0..1`
    #[serde(rename = "0..1")]
    Optional,
    /// `0..n`
    #[serde(rename = "0..n")]
    Multiple,
    /// `1..1`
    #[default]
    #[serde(rename = "1..1")]
    Mandatory,
    /// `1..n`
    #[serde(rename = "1..n")]
    AtLeastOne,
}

impl Cardinality {
    /// True if at least one provider is required
    pub fn is_required(self) -> bool {
        matches!(self, Self::Mandatory | Self::AtLeastOne)
    }

    /// True if more than one provider may be bound
    pub fn is_multiple(self) -> bool {
        matches!(self, Self::Multiple | Self::AtLeastOne)
    }

    /// High bound on the number of bound providers
    pub fn max(self) -> usize {
        if self.is_multiple() { usize::MAX } else { 1 }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Optional => "0..1",
            Self::Multiple => "0..n",
            Self::Mandatory => "1..1",
            Self::AtLeastOne => "1..n",
        })
    }
}

impl FromStr for Cardinality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0..1" => Ok(Self::Optional),
            "0..n" => Ok(Self::Multiple),
            "1..1" => Ok(Self::Mandatory),
            "1..n" => Ok(Self::AtLeastOne),
            other => Err(Error::configuration(format!(
                "Invalid cardinality: {other}. Use 0..1, 0..n, 1..1 or 1..n"
            ))),
        }
    }
}

/// Whether a bound reference may change without rebuilding its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Rebinding requires disposing the configuration
    #[default]
    Static,
    /// Providers are bound and unbound in place
    Dynamic,
}

/// What the bind/unbind methods receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BindParameter {
    /// The resolved service object
    #[default]
    Service,
    /// Only the provider handle; the service object is not acquired
    Reference,
}

/// Declared dependency of a component on a service interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDescription {
    /// Reference name, unique within the component
    pub name: String,
    /// Required service interface
    pub interface: String,
    /// Cardinality
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Binding policy
    #[serde(default)]
    pub policy: ReferencePolicy,
    /// Declared target filter
    #[serde(default)]
    pub target: Option<String>,
    /// Bind method name
    #[serde(default)]
    pub bind: Option<String>,
    /// Unbind method name
    #[serde(default)]
    pub unbind: Option<String>,
    /// Bind method parameter kind
    #[serde(default)]
    pub parameter: BindParameter,
}

impl ReferenceDescription {
    /// Mandatory static reference without callbacks
    pub fn new(name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: interface.into(),
            cardinality: Cardinality::default(),
            policy: ReferencePolicy::default(),
            target: None,
            bind: None,
            unbind: None,
            parameter: BindParameter::default(),
        }
    }

    /// Set the cardinality
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Use the dynamic policy
    pub fn dynamic(mut self) -> Self {
        self.policy = ReferencePolicy::Dynamic;
        self
    }

    /// Set the declared target filter
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set bind and unbind method names
    pub fn with_methods(mut self, bind: impl Into<String>, unbind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self.unbind = Some(unbind.into());
        self
    }

    /// Bind methods receive the provider handle instead of the service object
    pub fn by_reference(mut self) -> Self {
        self.parameter = BindParameter::Reference;
        self
    }

    /// True if the reference must have a provider to be satisfied
    pub fn is_required(&self) -> bool {
        self.cardinality.is_required()
    }

    /// True if the policy is dynamic
    pub fn is_dynamic(&self) -> bool {
        self.policy == ReferencePolicy::Dynamic
    }
}

/// Provided-service declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Interfaces the service is registered under
    pub interfaces: Vec<String>,
    /// One instance per consumer instead of one shared instance
    #[serde(default)]
    pub servicefactory: bool,
}

impl ServiceDescription {
    /// Shared service under the given interfaces
    pub fn new<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interfaces: interfaces.into_iter().map(Into::into).collect(),
            servicefactory: false,
        }
    }

    /// Per-consumer service factory
    pub fn per_consumer(mut self) -> Self {
        self.servicefactory = true;
        self
    }
}

/// How configuration data backs a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationPolicy {
    /// Use configuration data when present
    #[default]
    Optional,
    /// Create no configuration until data exists
    Require,
    /// Never consult the configuration provider
    Ignore,
}

/// Immutable declarative template for one component
#[derive(Clone)]
pub struct ComponentDescription {
    /// Component name, unique within the runtime
    pub name: String,
    /// Identity used to acquire services on behalf of the component
    pub owner: ConsumerId,
    /// Creates implementation instances
    pub implementation: Arc<dyn ComponentFactory>,
    /// Declarative default properties
    pub properties: Properties,
    /// Declared references in declaration order
    pub references: Vec<ReferenceDescription>,
    /// Provided service, if any
    pub service: Option<ServiceDescription>,
    /// Explicit immediate flag; `None` derives it from the service declaration
    pub immediate: Option<bool>,
    /// Component factory identifier
    pub factory: Option<String>,
    /// Activate callback name
    pub activate: Option<String>,
    /// Deactivate callback name
    pub deactivate: Option<String>,
    /// Configuration policy
    pub configuration_policy: ConfigurationPolicy,
    /// Configuration PID; defaults to the component name
    pub configuration_pid: Option<String>,
}

impl ComponentDescription {
    /// Immediate component without references or service
    pub fn new(name: impl Into<String>, implementation: Arc<dyn ComponentFactory>) -> Self {
        let name = name.into();
        Self {
            owner: ConsumerId::new(name.clone()),
            name,
            implementation,
            properties: Properties::new(),
            references: Vec::new(),
            service: None,
            immediate: None,
            factory: None,
            activate: Some("activate".to_string()),
            deactivate: Some("deactivate".to_string()),
            configuration_policy: ConfigurationPolicy::default(),
            configuration_pid: None,
        }
    }

    /// Set the owning consumer identity
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = ConsumerId::new(owner);
        self
    }

    /// Add a declarative property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Append a reference
    pub fn with_reference(mut self, reference: ReferenceDescription) -> Self {
        self.references.push(reference);
        self
    }

    /// Declare the provided service
    pub fn with_service(mut self, service: ServiceDescription) -> Self {
        self.service = Some(service);
        self
    }

    /// Force immediate or delayed activation
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = Some(immediate);
        self
    }

    /// Make this a component factory
    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    /// Override the lifecycle callback names
    pub fn with_lifecycle(mut self, activate: Option<&str>, deactivate: Option<&str>) -> Self {
        self.activate = activate.map(str::to_string);
        self.deactivate = deactivate.map(str::to_string);
        self
    }

    /// Set the configuration policy
    pub fn with_configuration_policy(mut self, policy: ConfigurationPolicy) -> Self {
        self.configuration_policy = policy;
        self
    }

    /// Set the configuration PID
    pub fn with_configuration_pid(mut self, pid: impl Into<String>) -> Self {
        self.configuration_pid = Some(pid.into());
        self
    }

    /// Effective configuration PID
    pub fn pid(&self) -> &str {
        self.configuration_pid.as_deref().unwrap_or(&self.name)
    }

    /// Effective activation mode; components without a service are immediate
    pub fn is_immediate(&self) -> bool {
        self.immediate
            .unwrap_or(self.service.is_none() && self.factory.is_none())
    }

    /// True if a provided service is built per consumer
    pub fn is_service_factory(&self) -> bool {
        self.service.as_ref().is_some_and(|s| s.servicefactory)
    }

    /// True if this is a component factory description
    pub fn is_component_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Reject inconsistent declarations
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(Error::configuration(format!("{}: {message}", self.name)));

        if self.name.trim().is_empty() {
            return Err(Error::configuration("Component name cannot be empty"));
        }
        if let Some(service) = &self.service {
            if service.interfaces.is_empty() || service.interfaces.iter().any(|i| i.trim().is_empty()) {
                return fail("provided service must name at least one non-empty interface".into());
            }
            if service.servicefactory && self.immediate == Some(true) {
                return fail("a service factory cannot be immediate".into());
            }
            if service.servicefactory && self.factory.is_some() {
                return fail("a component factory cannot be a service factory".into());
            }
        }
        if self.factory.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return fail("component factory identifier cannot be empty".into());
        }
        if !self.is_immediate() && self.service.is_none() && self.factory.is_none() {
            return fail("a delayed component must provide a service".into());
        }

        let mut names = HashSet::new();
        for reference in &self.references {
            if reference.name.trim().is_empty() || reference.interface.trim().is_empty() {
                return fail("references need a name and an interface".into());
            }
            if !names.insert(reference.name.as_str()) {
                return fail(format!("duplicate reference name {}", reference.name));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ComponentDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescription")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("references", &self.references)
            .field("service", &self.service)
            .field("immediate", &self.is_immediate())
            .field("factory", &self.factory)
            .field("configuration_policy", &self.configuration_policy)
            .field("configuration_pid", &self.pid())
            .finish_non_exhaustive()
    }
}
