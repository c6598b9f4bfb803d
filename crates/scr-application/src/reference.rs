//! Reference binding state
//!
//! A [`Reference`] is one declared dependency bound to its owning component
//! configuration. It resolves the target filter once, answers the
//! satisfaction and dynamic-rebinding questions the resolver asks, and holds
//! the ordered set of bound providers together with the service objects
//! acquired for them.

use crate::configuration::ComponentConfiguration;
use parking_lot::Mutex;
use scr_domain::constants::{OBJECT_CLASS, TARGET_PROPERTY_SUFFIX};
use scr_domain::error::Result;
use scr_domain::ports::ServiceRegistry;
use scr_domain::{
    BindParameter, ConfigurationId, Filter, Properties, ReferenceDescription, ServiceId,
    ServiceObject, ServiceReference, sort_by_ranking,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct BindingState {
    /// Bound providers in bind order
    bound: Vec<ServiceReference>,
    /// Service objects acquired for bound providers
    services: HashMap<ServiceId, ServiceObject>,
}

/// One bound provider removed from a reference
pub struct Unbound {
    /// Provider handle
    pub provider: ServiceReference,
    /// Service object acquired for it, if any
    pub service: Option<ServiceObject>,
}

/// Declared dependency of one component configuration
pub struct Reference {
    description: ReferenceDescription,
    owner: ConfigurationId,
    target: Filter,
    state: Mutex<BindingState>,
}

impl Reference {
    /// Create the reference for configuration `owner` with merged `properties`
    pub fn new(
        description: ReferenceDescription,
        owner: ConfigurationId,
        properties: &Properties,
    ) -> Result<Self> {
        let target = Self::resolve_target(&description, properties)?;
        Ok(Self {
            description,
            owner,
            target,
            state: Mutex::new(BindingState::default()),
        })
    }

    /// Target filter: `<name>.target` property, then the declared target,
    /// then `(objectClass=<interface>)`
    pub fn resolve_target(description: &ReferenceDescription, properties: &Properties) -> Result<Filter> {
        let key = format!("{}{TARGET_PROPERTY_SUFFIX}", description.name);
        if let Some(Value::String(target)) = properties.get(&key) {
            return Filter::parse(target);
        }
        match &description.target {
            Some(target) => Filter::parse(target),
            None => Ok(Filter::object_class(&description.interface)),
        }
    }

    /// Reference name
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Required service interface
    pub fn interface(&self) -> &str {
        &self.description.interface
    }

    /// Declared reference
    pub fn description(&self) -> &ReferenceDescription {
        &self.description
    }

    /// Owning configuration
    pub fn owner(&self) -> ConfigurationId {
        self.owner
    }

    /// Resolved target filter
    pub fn target(&self) -> &Filter {
        &self.target
    }

    /// True if the cardinality requires a provider
    pub fn is_required(&self) -> bool {
        self.description.is_required()
    }

    /// True if the policy is dynamic
    pub fn is_dynamic(&self) -> bool {
        self.description.is_dynamic()
    }

    /// Cardinality high bound
    pub fn max(&self) -> usize {
        self.description.cardinality.max()
    }

    /// Bind method name
    pub fn bind_method(&self) -> Option<&str> {
        self.description.bind.as_deref()
    }

    /// Unbind method name
    pub fn unbind_method(&self) -> Option<&str> {
        self.description.unbind.as_deref()
    }

    /// True if bind methods receive the provider handle instead of the service
    pub fn takes_reference(&self) -> bool {
        self.description.parameter == BindParameter::Reference
    }

    /// True if `candidate` implements the interface and matches the target
    pub fn matches(&self, candidate: &ServiceReference) -> bool {
        candidate.implements(self.interface()) && candidate.matches(&self.target)
    }

    /// Current matching providers, highest ranked first
    pub fn providers(&self, registry: &dyn ServiceRegistry) -> Vec<ServiceReference> {
        let mut candidates = registry.query(self.interface(), Some(&self.target));
        sort_by_ranking(&mut candidates);
        candidates
    }

    /// True if at least one matching provider other than `departing` exists
    pub fn has_provider(&self, registry: &dyn ServiceRegistry, departing: Option<ServiceId>) -> bool {
        registry
            .query(self.interface(), Some(&self.target))
            .iter()
            .any(|candidate| Some(candidate.id()) != departing)
    }

    /// True if `candidate` can be added to this reference without a rebuild
    pub fn dynamic_bind_reference(&self, candidate: &ServiceReference) -> bool {
        self.is_dynamic()
            && self.matches(candidate)
            && !self.is_bound(candidate.id())
            && self.bound_count() < self.max()
    }

    /// True if `candidate` can be removed from this reference without a rebuild
    pub fn dynamic_unbind_reference(&self, candidate: &ServiceReference) -> bool {
        self.is_dynamic() && self.is_bound(candidate.id())
    }

    /// The enabled configuration whose provided service would satisfy this reference
    pub fn find_provider_configuration<'a, I>(&self, candidates: I) -> Option<&'a Arc<ComponentConfiguration>>
    where
        I: IntoIterator<Item = &'a Arc<ComponentConfiguration>>,
    {
        candidates.into_iter().find(|candidate| {
            let interfaces = candidate.provided_interfaces();
            if !interfaces.iter().any(|i| i == self.interface()) {
                return false;
            }
            let properties = candidate
                .service_properties()
                .with(OBJECT_CLASS, interfaces.to_vec());
            self.target.matches(&properties)
        })
    }

    /// Snapshot of the bound providers in bind order
    pub fn bound(&self) -> Vec<ServiceReference> {
        self.state.lock().bound.clone()
    }

    /// Number of bound providers
    pub fn bound_count(&self) -> usize {
        self.state.lock().bound.len()
    }

    /// True if the provider is bound
    pub fn is_bound(&self, id: ServiceId) -> bool {
        self.state.lock().bound.iter().any(|r| r.id() == id)
    }

    /// Service object acquired for a bound provider
    pub fn cached_service(&self, id: ServiceId) -> Option<ServiceObject> {
        self.state.lock().services.get(&id).cloned()
    }

    /// Record a newly bound provider; false if it was already bound
    pub(crate) fn add_bound(&self, provider: ServiceReference, service: Option<ServiceObject>) -> bool {
        let mut state = self.state.lock();
        if state.bound.iter().any(|r| r.id() == provider.id()) {
            return false;
        }
        if let Some(service) = service {
            state.services.insert(provider.id(), service);
        }
        state.bound.push(provider);
        true
    }

    /// Forget one bound provider
    pub(crate) fn remove_bound(&self, id: ServiceId) -> Option<Unbound> {
        let mut state = self.state.lock();
        let position = state.bound.iter().position(|r| r.id() == id)?;
        let provider = state.bound.remove(position);
        let service = state.services.remove(&id);
        Some(Unbound { provider, service })
    }

    /// Forget every bound provider, most recently bound first
    pub(crate) fn clear(&self) -> Vec<Unbound> {
        let mut state = self.state.lock();
        let mut services = std::mem::take(&mut state.services);
        std::mem::take(&mut state.bound)
            .into_iter()
            .rev()
            .map(|provider| {
                let service = services.remove(&provider.id());
                Unbound { provider, service }
            })
            .collect()
    }
}

impl std::fmt::Debug for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reference")
            .field("name", &self.description.name)
            .field("interface", &self.description.interface)
            .field("owner", &self.owner)
            .field("target", &self.target.as_str())
            .field("bound", &self.bound_count())
            .finish()
    }
}
