//! Resolver
//!
//! Owns the *enabled* and *satisfied* configuration sets and routes registry
//! events. Recomputation runs synchronously on the event-delivery thread under
//! the resolver lock and never calls user code; lifecycle work is either
//! queued for the worker or, for teardown, run after the lock is released.
//!
//! | Event | Handling |
//! |-------|----------|
//! | configurations added | break cycles, queue BUILD for the newly satisfied |
//! | REGISTERED | queue DYNAMICBIND, then BUILD for the newly satisfied |
//! | MODIFIED | dispose the newly unsatisfied, unbind non-matching providers, then bind pass |
//! | UNREGISTERING | dispose the newly unsatisfied, unbind the departing provider |

pub mod cycles;

use crate::build::{ConfigurationLookup, DisposeReason};
use crate::component_factory::ComponentInstanceHandle;
use crate::configuration::{ComponentConfiguration, Lifecycle};
use crate::events::ComponentEventBus;
use crate::instance_process::InstanceProcess;
use crate::reference::Reference;
use crate::work_queue::{WorkAction, WorkDispatcher, WorkQueue};
use parking_lot::Mutex;
use scr_domain::constants::{COMPONENT_FACTORY_SERVICE, SERVICE_PID};
use scr_domain::error::{Error, Result};
use scr_domain::ports::{ConfigurationProvider, ServiceEvent, ServiceEventKind, ServiceListener, ServiceRegistry};
use scr_domain::{
    ComponentDescription, ComponentEvent, ConfigurationId, ConfigurationPolicy, Properties,
    ServiceId, ServiceReference,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

struct ResolverState {
    lifecycle: Lifecycle,
    descriptions: BTreeMap<String, Arc<ComponentDescription>>,
    enabled: BTreeMap<ConfigurationId, Arc<ComponentConfiguration>>,
    satisfied: BTreeMap<ConfigurationId, Arc<ComponentConfiguration>>,
    /// Services announced as UNREGISTERING and possibly still in the registry
    departed: BTreeSet<ServiceId>,
}

/// Change of the satisfied set produced by one recomputation
#[derive(Default)]
struct SatisfactionDiff {
    satisfied: Vec<Arc<ComponentConfiguration>>,
    unsatisfied: Vec<Arc<ComponentConfiguration>>,
}

/// Satisfied-set computation, cycle breaking and event routing
pub struct Resolver {
    registry: Arc<dyn ServiceRegistry>,
    configurations: Option<Arc<dyn ConfigurationProvider>>,
    queue: WorkQueue,
    process: Arc<InstanceProcess>,
    events: ComponentEventBus,
    state: Mutex<ResolverState>,
    next_id: AtomicU64,
    this: Weak<Resolver>,
}

impl Resolver {
    /// Create the resolver together with its instance process
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        configurations: Option<Arc<dyn ConfigurationProvider>>,
        queue: WorkQueue,
        events: ComponentEventBus,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| Self {
            process: InstanceProcess::new(this.clone(), Arc::clone(&registry), queue.clone(), events.clone()),
            registry,
            configurations,
            queue,
            events,
            state: Mutex::new(ResolverState {
                lifecycle: Lifecycle::Active,
                descriptions: BTreeMap::new(),
                enabled: BTreeMap::new(),
                satisfied: BTreeMap::new(),
                departed: BTreeSet::new(),
            }),
            next_id: AtomicU64::new(1),
            this: this.clone(),
        })
    }

    /// Instance process driven by this resolver
    pub fn process(&self) -> &Arc<InstanceProcess> {
        &self.process
    }

    fn next_id(&self) -> ConfigurationId {
        ConfigurationId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True if the configuration is in the enabled set
    pub fn is_enabled(&self, id: ConfigurationId) -> bool {
        self.state.lock().enabled.contains_key(&id)
    }

    /// Satisfied configuration with this id
    pub fn satisfied_configuration(&self, id: ConfigurationId) -> Option<Arc<ComponentConfiguration>> {
        self.state.lock().satisfied.get(&id).cloned()
    }

    /// Enabled configurations in id order
    pub fn configurations(&self) -> Vec<Arc<ComponentConfiguration>> {
        self.state.lock().enabled.values().cloned().collect()
    }

    /// Ids of the enabled configurations
    pub fn enabled_ids(&self) -> Vec<ConfigurationId> {
        self.state.lock().enabled.keys().copied().collect()
    }

    /// Ids of the satisfied configurations
    pub fn satisfied_ids(&self) -> Vec<ConfigurationId> {
        self.state.lock().satisfied.keys().copied().collect()
    }

    /// Enabled configurations of a description
    pub fn configurations_of(&self, name: &str) -> Vec<Arc<ComponentConfiguration>> {
        self.state
            .lock()
            .enabled
            .values()
            .filter(|c| c.name() == name)
            .cloned()
            .collect()
    }

    /// Names of the enabled descriptions
    pub fn description_names(&self) -> Vec<String> {
        self.state.lock().descriptions.keys().cloned().collect()
    }

    /// Enabled descriptions backed by configuration `pid`
    pub fn descriptions_for_pid(&self, pid: &str) -> Vec<String> {
        self.state
            .lock()
            .descriptions
            .values()
            .filter(|d| d.configuration_policy != ConfigurationPolicy::Ignore && d.pid() == pid)
            .map(|d| d.name.clone())
            .collect()
    }

    // ========================================================================
    // Enable / disable
    // ========================================================================

    /// Enable descriptions and resolve the new configurations
    ///
    /// Each description is validated and materialized on its own; a failure
    /// aborts only that description. All failures are returned together
    /// after the valid descriptions were enabled.
    pub fn enable<I>(&self, descriptions: I) -> Result<()>
    where
        I: IntoIterator<Item = ComponentDescription>,
    {
        let mut failures = Vec::new();
        let mut added = 0;
        for description in descriptions {
            let name = description.name.clone();
            match self.enable_description(description) {
                Ok(count) => added += count,
                Err(e) => {
                    error!(component = %name, error = %e, "failed to enable component");
                    failures.push(e);
                }
            }
        }
        if added > 0 {
            self.resolve();
        }
        collect_failures(failures)
    }

    fn enable_description(&self, description: ComponentDescription) -> Result<usize> {
        description.validate()?;
        {
            let state = self.state.lock();
            if state.lifecycle == Lifecycle::Disposed {
                return Err(Error::disposed("service component runtime"));
            }
            if state.descriptions.contains_key(&description.name) {
                return Err(Error::configuration(format!(
                    "component {} is already enabled",
                    description.name
                )));
            }
        }

        let description = Arc::new(description);
        let configurations = self.materialize(&description)?;
        {
            let mut state = self.state.lock();
            if state.descriptions.contains_key(&description.name) {
                return Err(Error::configuration(format!(
                    "component {} is already enabled",
                    description.name
                )));
            }
            state
                .descriptions
                .insert(description.name.clone(), Arc::clone(&description));
            for configuration in &configurations {
                state.enabled.insert(configuration.id(), Arc::clone(configuration));
            }
        }

        info!(component = %description.name, configurations = configurations.len(), "component enabled");
        for configuration in &configurations {
            self.publish_enabled(configuration);
        }
        Ok(configurations.len())
    }

    /// Configurations for a description according to its configuration policy
    fn materialize(&self, description: &Arc<ComponentDescription>) -> Result<Vec<Arc<ComponentConfiguration>>> {
        let policy = description.configuration_policy;
        let data_sets: Vec<Option<Properties>> = match (&self.configurations, policy) {
            (_, ConfigurationPolicy::Ignore) => vec![None],
            (None, ConfigurationPolicy::Optional) => vec![None],
            (None, ConfigurationPolicy::Require) => Vec::new(),
            (Some(provider), _) => {
                let pid = description.pid();
                let singleton = provider.get(pid);
                let factory = provider.list(pid);
                match (singleton, factory.is_empty()) {
                    (Some(_), false) => {
                        return Err(Error::configuration(format!(
                            "{}: configuration {pid} has both singleton and factory data",
                            description.name
                        )));
                    }
                    (Some(data), true) => vec![Some(data)],
                    (None, false) => factory.into_iter().map(Some).collect(),
                    (None, true) if policy == ConfigurationPolicy::Optional => vec![None],
                    (None, true) => Vec::new(),
                }
            }
        };

        data_sets
            .iter()
            .map(|data| self.create_configuration(description, data.as_ref(), None, false))
            .collect()
    }

    fn create_configuration(
        &self,
        description: &Arc<ComponentDescription>,
        data: Option<&Properties>,
        extra: Option<&Properties>,
        factory_instance: bool,
    ) -> Result<Arc<ComponentConfiguration>> {
        ComponentConfiguration::new(self.next_id(), Arc::clone(description), data, extra, factory_instance)
            .map(Arc::new)
    }

    /// Disable descriptions, synchronously disposing all their configurations
    pub fn disable<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        let mut missing = Vec::new();
        let removed = {
            let mut state = self.state.lock();
            for name in &names {
                if state.descriptions.remove(name).is_none() {
                    missing.push(name.clone());
                }
            }
            take_configurations(&mut state, |c| names.iter().any(|n| n == c.name()))
        };

        for configuration in removed.iter().rev() {
            self.process.dispose(configuration, DisposeReason::Removed);
        }
        if !names.is_empty() {
            info!(components = ?names, "components disabled");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::not_found(format!("component {}", missing.join(", "))))
        }
    }

    /// Disable every description and refuse further work
    pub fn shutdown(&self) {
        let names = {
            let mut state = self.state.lock();
            state.lifecycle = Lifecycle::Disposed;
            state.descriptions.keys().cloned().collect::<Vec<_>>()
        };
        if let Err(e) = self.disable(&names) {
            warn!(error = %e, "shutdown could not disable every component");
        }
        self.process.build().shutdown();
    }

    /// Remove and dispose one configuration; false if it was not enabled
    pub fn remove_configuration(&self, id: ConfigurationId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            take_configurations(&mut state, |c| c.id() == id)
        };
        for configuration in &removed {
            self.process.dispose(configuration, DisposeReason::Removed);
        }
        !removed.is_empty()
    }

    // ========================================================================
    // Configuration changes
    // ========================================================================

    /// Rebuild a description with fresh configuration data
    pub fn reconfigure(&self, name: &str) -> Result<()> {
        let Some(description) = self.state.lock().descriptions.get(name).cloned() else {
            return Err(Error::not_found(format!("component {name}")));
        };
        self.disable([name])?;
        self.enable([(*description).clone()])
    }

    /// Create, replace or remove the configuration for factory configuration `pid`
    pub fn refresh_factory_configuration(&self, name: &str, factory_pid: &str, pid: &str) -> Result<()> {
        let Some(description) = self.state.lock().descriptions.get(name).cloned() else {
            return Err(Error::not_found(format!("component {name}")));
        };
        let Some(provider) = self.configurations.clone() else {
            return Ok(());
        };

        if provider.get(factory_pid).is_some() {
            return Err(Error::configuration(format!(
                "{name}: configuration {factory_pid} has both singleton and factory data"
            )));
        }
        let data = provider
            .list(factory_pid)
            .into_iter()
            .find(|p| p.string(SERVICE_PID) == Some(pid));

        let replaced = {
            let mut state = self.state.lock();
            take_configurations(&mut state, |c| {
                c.name() == name
                    && !c.is_factory_instance()
                    && (c.pid() == Some(pid) || (c.pid().is_none() && data.is_some()))
            })
        };
        for configuration in &replaced {
            self.process.dispose(configuration, DisposeReason::Removed);
        }

        let created = match data {
            Some(data) => Some(self.create_configuration(&description, Some(&data), None, false)?),
            None => {
                let remaining = self
                    .configurations_of(name)
                    .iter()
                    .any(|c| !c.is_factory_instance());
                if remaining || description.configuration_policy != ConfigurationPolicy::Optional {
                    None
                } else {
                    Some(self.create_configuration(&description, None, None, false)?)
                }
            }
        };

        if let Some(configuration) = created {
            {
                let mut state = self.state.lock();
                if !state.descriptions.contains_key(name) {
                    return Ok(());
                }
                state.enabled.insert(configuration.id(), Arc::clone(&configuration));
            }
            self.publish_enabled(&configuration);
            self.resolve();
        }
        Ok(())
    }

    // ========================================================================
    // Component factories
    // ========================================================================

    /// Create, enable and activate one instance of a component factory
    pub fn new_factory_instance(
        &self,
        factory: &Arc<ComponentConfiguration>,
        properties: Properties,
    ) -> Result<ComponentInstanceHandle> {
        let extra = factory.properties().merged(&properties);
        let configuration = self.create_configuration(factory.description(), None, Some(&extra), true)?;

        let satisfied = {
            let mut state = self.state.lock();
            if state.lifecycle == Lifecycle::Disposed {
                return Err(Error::disposed("service component runtime"));
            }
            if !state.satisfied.contains_key(&factory.id()) {
                return Err(Error::configuration(format!(
                    "component factory {} is not satisfied",
                    factory.name()
                )));
            }
            state.enabled.insert(configuration.id(), Arc::clone(&configuration));
            let satisfied = self.check_satisfied(&configuration, None);
            if satisfied {
                state.satisfied.insert(configuration.id(), Arc::clone(&configuration));
            } else {
                state.enabled.remove(&configuration.id());
            }
            satisfied
        };
        if !satisfied {
            return Err(Error::configuration(format!(
                "instance of component factory {} is not satisfied",
                factory.name()
            )));
        }

        self.publish_enabled(&configuration);
        self.publish_satisfied(&configuration);
        match self.process.activate_factory_instance(self, &configuration) {
            Ok(instance) => Ok(ComponentInstanceHandle::new(configuration, instance, self.this.clone())),
            Err(e) => {
                self.remove_configuration(configuration.id());
                Err(e)
            }
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Break cycles, recompute the satisfied set and queue BUILD for the
    /// newly satisfied; returns the satisfied ids
    pub fn resolve(&self) -> Vec<ConfigurationId> {
        let (resolution, diff, satisfied) = {
            let mut state = self.state.lock();
            if state.lifecycle == Lifecycle::Disposed {
                return Vec::new();
            }
            let resolution = cycles::resolve_cycles(&mut state.enabled);
            for removed in &resolution.removed {
                state.satisfied.remove(&removed.id());
            }
            let diff = self.recompute(&mut state, None);
            let satisfied: Vec<ConfigurationId> = state.satisfied.keys().copied().collect();
            (resolution, diff, satisfied)
        };

        for note in resolution.notes {
            info!(
                component_id = %note.consumer,
                producer = %note.producer,
                reference = %note.reference,
                "dependency cycle broken; producer will not be activated eagerly"
            );
            self.events.publish(ComponentEvent::CycleBroken {
                consumer: note.consumer,
                producer: note.producer,
                reference: note.reference,
            });
        }
        for removed in &resolution.removed {
            self.events.publish(ComponentEvent::CycleRemoved {
                name: removed.name().to_string(),
                id: removed.id(),
            });
            self.process.dispose(removed, DisposeReason::Removed);
        }

        self.apply(diff);
        satisfied
    }

    /// True if every required reference has a provider other than
    /// `departing` and the owner may register every provided interface
    fn check_satisfied(&self, configuration: &ComponentConfiguration, departing: Option<ServiceId>) -> bool {
        if !configuration.is_active() {
            return false;
        }
        let references_ok = configuration
            .references()
            .iter()
            .filter(|r| r.is_required())
            .all(|r| r.has_provider(self.registry.as_ref(), departing));
        if !references_ok {
            return false;
        }

        let description = configuration.description();
        let owner = configuration.owner();
        let factory_service = description.is_component_factory() && !configuration.is_factory_instance();
        if factory_service && !self.registry.has_register_permission(owner, COMPONENT_FACTORY_SERVICE) {
            return false;
        }
        configuration
            .provided_interfaces()
            .iter()
            .all(|interface| self.registry.has_register_permission(owner, interface))
    }

    fn recompute(&self, state: &mut ResolverState, departing: Option<ServiceId>) -> SatisfactionDiff {
        let mut diff = SatisfactionDiff::default();
        let now: BTreeMap<ConfigurationId, Arc<ComponentConfiguration>> = state
            .enabled
            .iter()
            .filter(|(_, c)| self.check_satisfied(c, departing))
            .map(|(id, c)| (*id, Arc::clone(c)))
            .collect();

        for (id, configuration) in &now {
            if !state.satisfied.contains_key(id) {
                diff.satisfied.push(Arc::clone(configuration));
            }
        }
        for (id, configuration) in &state.satisfied {
            if !now.contains_key(id) {
                diff.unsatisfied.push(Arc::clone(configuration));
            }
        }
        state.satisfied = now;
        diff
    }

    fn apply(&self, diff: SatisfactionDiff) {
        self.dispose_unsatisfied(&diff.unsatisfied);
        for configuration in &diff.satisfied {
            self.publish_satisfied(configuration);
        }
        self.enqueue(WorkAction::Build(diff.satisfied));
    }

    fn dispose_unsatisfied(&self, configurations: &[Arc<ComponentConfiguration>]) {
        for configuration in configurations {
            debug!(component = configuration.name(), component_id = %configuration.id(), "component unsatisfied");
            self.events.publish(ComponentEvent::Unsatisfied {
                name: configuration.name().to_string(),
                id: configuration.id(),
            });
            self.process.dispose(configuration, DisposeReason::Unsatisfied);
        }
    }

    fn enqueue(&self, action: WorkAction) {
        if action.is_empty() {
            return;
        }
        let tag = action.tag();
        let target: Arc<dyn WorkDispatcher> = Arc::clone(&self.process) as Arc<dyn WorkDispatcher>;
        if let Err(e) = self.queue.enqueue(target, action) {
            warn!(action = tag, error = %e, "could not queue work");
        }
    }

    // ========================================================================
    // Event routing
    // ========================================================================

    /// Dynamic references of satisfied configurations that can take `candidate`
    fn select_dynamic_bind(state: &ResolverState, candidate: &ServiceReference) -> Vec<Arc<Reference>> {
        state
            .satisfied
            .values()
            .filter(|c| candidate.component() != Some(c.id()))
            .flat_map(|c| c.references().iter())
            .filter(|r| r.bind_method().is_some() && r.dynamic_bind_reference(candidate))
            .cloned()
            .collect()
    }

    /// References bound to `provider` that must let go of it
    ///
    /// Dynamic references are returned for in-place unbinding; owners of
    /// static references are returned for teardown.
    #[allow(clippy::type_complexity)]
    fn select_dynamic_unbind(
        state: &ResolverState,
        provider: &ServiceReference,
        departing: bool,
    ) -> (
        Vec<(Arc<ComponentConfiguration>, Arc<Reference>)>,
        Vec<Arc<ComponentConfiguration>>,
    ) {
        let mut unbinds = Vec::new();
        let mut teardown = Vec::new();
        for configuration in state.satisfied.values() {
            let mut rebuild = false;
            for reference in configuration.references() {
                if !reference.is_bound(provider.id()) || (!departing && reference.matches(provider)) {
                    continue;
                }
                if reference.dynamic_unbind_reference(provider) {
                    unbinds.push((Arc::clone(configuration), Arc::clone(reference)));
                } else {
                    rebuild = true;
                }
            }
            if rebuild {
                teardown.push(Arc::clone(configuration));
            }
        }
        (unbinds, teardown)
    }

    fn unbind_and_rebuild(&self, provider: &ServiceReference, departing: bool) {
        let (unbinds, teardown) = {
            let state = self.state.lock();
            Self::select_dynamic_unbind(&state, provider, departing)
        };

        for (configuration, reference) in &unbinds {
            self.process.unbind_dynamic(configuration, reference, provider);
        }

        if teardown.is_empty() {
            return;
        }
        let exclude = departing.then(|| provider.id());
        for configuration in &teardown {
            debug!(
                component = configuration.name(),
                service_id = %provider.id(),
                "static reference lost its provider; rebuilding"
            );
            self.process.dispose(configuration, DisposeReason::Unsatisfied);
        }
        let rebuild: Vec<_> = {
            let state = self.state.lock();
            teardown
                .into_iter()
                .filter(|c| state.satisfied.contains_key(&c.id()) && self.check_satisfied(c, exclude))
                .collect()
        };
        self.enqueue(WorkAction::Build(rebuild));
    }

    fn handle_registered(&self, provider: &ServiceReference) {
        let (binds, diff) = {
            let mut state = self.state.lock();
            self.prune_departed(&mut state);
            let binds = Self::select_dynamic_bind(&state, provider);
            let diff = self.recompute(&mut state, None);
            (binds, diff)
        };
        self.enqueue(WorkAction::DynamicBind(binds));
        self.apply(diff);
    }

    fn handle_modified(&self, provider: &ServiceReference) {
        let diff = {
            let mut state = self.state.lock();
            self.recompute(&mut state, None)
        };
        self.dispose_unsatisfied(&diff.unsatisfied);

        self.unbind_and_rebuild(provider, false);

        let (binds, bind_diff) = {
            let mut state = self.state.lock();
            let binds = Self::select_dynamic_bind(&state, provider);
            let bind_diff = self.recompute(&mut state, None);
            (binds, bind_diff)
        };
        self.enqueue(WorkAction::DynamicBind(binds));
        let mut satisfied = diff.satisfied;
        satisfied.extend(bind_diff.satisfied);
        self.apply(SatisfactionDiff {
            satisfied,
            unsatisfied: bind_diff.unsatisfied,
        });
    }

    fn handle_unregistering(&self, provider: &ServiceReference) {
        let diff = {
            let mut state = self.state.lock();
            self.prune_departed(&mut state);
            state.departed.insert(provider.id());
            self.recompute(&mut state, Some(provider.id()))
        };
        self.apply(diff);
        self.unbind_and_rebuild(provider, true);
    }
}

impl Resolver {
    /// Forget departed services the registry has finished removing
    fn prune_departed(&self, state: &mut ResolverState) {
        state
            .departed
            .retain(|id| self.registry.reference(*id).is_some());
    }
}

impl ServiceListener for Resolver {
    fn service_changed(&self, event: &ServiceEvent) {
        if self.state.lock().lifecycle == Lifecycle::Disposed {
            return;
        }
        debug!(kind = ?event.kind, service_id = %event.reference.id(), "service changed");
        match event.kind {
            ServiceEventKind::Registered => self.handle_registered(&event.reference),
            ServiceEventKind::Modified => self.handle_modified(&event.reference),
            ServiceEventKind::Unregistering => self.handle_unregistering(&event.reference),
        }
    }
}

impl ConfigurationLookup for Resolver {
    fn configuration(&self, id: ConfigurationId) -> Option<Arc<ComponentConfiguration>> {
        self.state.lock().enabled.get(&id).cloned()
    }

    fn is_satisfied(&self, id: ConfigurationId) -> bool {
        self.state.lock().satisfied.contains_key(&id)
    }

    fn is_departing(&self, id: ServiceId) -> bool {
        self.state.lock().departed.contains(&id)
    }
}

impl Resolver {
    fn publish_enabled(&self, configuration: &ComponentConfiguration) {
        self.events.publish(ComponentEvent::Enabled {
            name: configuration.name().to_string(),
            id: configuration.id(),
        });
    }

    fn publish_satisfied(&self, configuration: &ComponentConfiguration) {
        debug!(component = configuration.name(), component_id = %configuration.id(), "component satisfied");
        self.events.publish(ComponentEvent::Satisfied {
            name: configuration.name().to_string(),
            id: configuration.id(),
        });
    }

    /// True if the configuration is in the satisfied set
    pub fn is_satisfied(&self, id: ConfigurationId) -> bool {
        ConfigurationLookup::is_satisfied(self, id)
    }

    /// Enabled configuration by id
    pub fn configuration(&self, id: ConfigurationId) -> Option<Arc<ComponentConfiguration>> {
        ConfigurationLookup::configuration(self, id)
    }
}

/// Remove matching configurations from both sets
fn take_configurations(
    state: &mut ResolverState,
    matches: impl Fn(&ComponentConfiguration) -> bool,
) -> Vec<Arc<ComponentConfiguration>> {
    let ids: Vec<ConfigurationId> = state
        .enabled
        .values()
        .filter(|c| matches(c))
        .map(|c| c.id())
        .collect();
    ids.iter()
        .filter_map(|id| {
            state.satisfied.remove(id);
            state.enabled.remove(id)
        })
        .collect()
}

pub(crate) fn collect_failures(mut failures: Vec<Error>) -> Result<()> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(Error::configuration(
            failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
        )),
    }
}
