//! Instance process
//!
//! Consumes work queue jobs on the worker thread, re-validating every payload
//! item against the current satisfied set before acting, and reacts to
//! configuration store notifications.

use crate::build::{BuildDispose, ConfigurationLookup, DisposeReason};
use crate::component_factory::ComponentFactoryService;
use crate::configuration::{ComponentConfiguration, ComponentInstance};
use crate::events::ComponentEventBus;
use crate::reference::Reference;
use crate::registration;
use crate::resolver::{Resolver, collect_failures};
use crate::work_queue::{WorkAction, WorkDispatcher, WorkQueue};
use scr_domain::constants::{COMPONENT_FACTORY, COMPONENT_FACTORY_SERVICE};
use scr_domain::error::{Error, Result};
use scr_domain::ports::{
    ConfigurationEvent, ConfigurationListener, ServiceRegistry, ServiceSource,
};
use scr_domain::{ComponentEvent, ServiceObject, ServiceReference};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Dispatch target for queued work
pub struct InstanceProcess {
    resolver: Weak<Resolver>,
    registry: Arc<dyn ServiceRegistry>,
    build: Arc<BuildDispose>,
    events: ComponentEventBus,
}

impl InstanceProcess {
    /// Create the process and its build engine
    pub fn new(
        resolver: Weak<Resolver>,
        registry: Arc<dyn ServiceRegistry>,
        queue: WorkQueue,
        events: ComponentEventBus,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let dispatcher: Weak<dyn WorkDispatcher> = this.clone();
            let lookup: Weak<dyn ConfigurationLookup> = resolver.clone();
            Self {
                resolver,
                build: Arc::new(BuildDispose::new(
                    Arc::clone(&registry),
                    events.clone(),
                    queue,
                    dispatcher,
                    lookup,
                )),
                registry,
                events,
            }
        })
    }

    /// Build/dispose engine
    pub fn build(&self) -> &Arc<BuildDispose> {
        &self.build
    }

    // ========================================================================
    // BUILD
    // ========================================================================

    fn process_build(&self, resolver: &Resolver, configurations: Vec<Arc<ComponentConfiguration>>) {
        for configuration in configurations {
            if !resolver.is_satisfied(configuration.id()) {
                debug!(component = configuration.name(), component_id = %configuration.id(), "no longer satisfied; skipping build");
                continue;
            }
            if !configuration.claim_publication() {
                debug!(component = configuration.name(), component_id = %configuration.id(), "already built; skipping");
                continue;
            }
            let outcome = self.build.serialized(|| self.publish(resolver, &configuration));
            if let Err(e) = outcome {
                error!(component = configuration.name(), component_id = %configuration.id(), error = %e, "build failed");
            }
        }
    }

    fn publish(&self, resolver: &Resolver, configuration: &Arc<ComponentConfiguration>) -> Result<()> {
        let description = configuration.description();
        if description.is_component_factory() && !configuration.is_factory_instance() {
            return self.register_component_factory(resolver, configuration);
        }
        if description.is_immediate() || configuration.is_factory_instance() {
            self.build.build_component_config_instance(None, configuration)?;
        }
        if description.service.is_some() {
            self.register_service(resolver, configuration)?;
        }
        Ok(())
    }

    fn register_service(&self, resolver: &Resolver, configuration: &Arc<ComponentConfiguration>) -> Result<()> {
        let source = registration::service_source(&self.build, configuration);
        let interfaces = configuration.provided_interfaces().to_vec();
        self.register(resolver, configuration, &interfaces, source)
    }

    fn register_component_factory(&self, resolver: &Resolver, configuration: &Arc<ComponentConfiguration>) -> Result<()> {
        let factory = ComponentFactoryService::new(Arc::clone(configuration), self.resolver.clone());
        let object: ServiceObject = Arc::new(factory);
        self.register(
            resolver,
            configuration,
            &[COMPONENT_FACTORY_SERVICE.to_string()],
            ServiceSource::Object(object),
        )
    }

    fn register(
        &self,
        resolver: &Resolver,
        configuration: &Arc<ComponentConfiguration>,
        interfaces: &[String],
        source: ServiceSource,
    ) -> Result<()> {
        let mut properties = configuration.service_properties();
        if let Some(factory) = &configuration.description().factory
            && !configuration.is_factory_instance()
        {
            properties.insert(COMPONENT_FACTORY, factory.clone());
        }

        let registered = self
            .registry
            .register(configuration.owner(), interfaces, source, properties)?;
        configuration.set_registration(registered.clone());

        // Torn down while registering
        if !configuration.is_active() || !resolver.is_satisfied(configuration.id()) {
            if let Some(stale) = configuration.take_registration() {
                let _ = self.registry.unregister(stale.id());
            }
            return Err(Error::disposed(format!("component configuration {}", configuration.name())));
        }

        info!(
            component = configuration.name(),
            component_id = %configuration.id(),
            service_id = %registered.id(),
            "service registered"
        );
        self.events.publish(ComponentEvent::ServiceRegistered {
            name: configuration.name().to_string(),
            id: configuration.id(),
            service_id: registered.id(),
        });
        Ok(())
    }

    // ========================================================================
    // DYNAMICBIND
    // ========================================================================

    fn process_dynamic_bind(&self, resolver: &Resolver, references: Vec<Arc<Reference>>) {
        for reference in references {
            let Some(configuration) = resolver.satisfied_configuration(reference.owner()) else {
                debug!(reference = reference.name(), component_id = %reference.owner(), "owner no longer satisfied; skipping bind");
                continue;
            };
            let instances = configuration.instances();
            if instances.is_empty() {
                continue;
            }
            self.build.bind_reference(&configuration, &reference, &instances, None);
        }
    }

    // ========================================================================
    // Synchronous entry points used by the resolver
    // ========================================================================

    /// Replace and unbind a departing provider of a dynamic reference
    pub fn unbind_dynamic(
        &self,
        configuration: &ComponentConfiguration,
        reference: &Arc<Reference>,
        departing: &ServiceReference,
    ) {
        self.build.unbind_dynamic_reference(configuration, reference, departing);
    }

    /// Tear down a configuration
    pub fn dispose(&self, configuration: &ComponentConfiguration, reason: DisposeReason) {
        self.build.dispose_component_configuration(configuration, reason);
    }

    /// Build a component factory instance on the calling thread
    pub fn activate_factory_instance(
        &self,
        resolver: &Resolver,
        configuration: &Arc<ComponentConfiguration>,
    ) -> Result<Arc<ComponentInstance>> {
        self.build.serialized(|| {
            if !configuration.claim_publication() {
                return Err(Error::internal(format!(
                    "factory instance {} was already built",
                    configuration.id()
                )));
            }
            let instance = self.build.build_component_config_instance(None, configuration)?;
            if configuration.description().service.is_some() {
                self.register_service(resolver, configuration)?;
            }
            Ok(instance)
        })
    }

    // ========================================================================
    // Configuration changes
    // ========================================================================

    fn handle_configuration_event(&self, resolver: &Resolver, event: &ConfigurationEvent) -> Result<()> {
        let pid = event.factory_pid.as_deref().unwrap_or(&event.pid);
        let names = resolver.descriptions_for_pid(pid);
        if names.is_empty() {
            debug!(pid = %event.pid, "no component uses this configuration");
            return Ok(());
        }

        let mut failures = Vec::new();
        for name in names {
            info!(component = %name, pid = %event.pid, kind = ?event.kind, "configuration changed");
            let outcome = match &event.factory_pid {
                None => resolver.reconfigure(&name),
                Some(factory_pid) => resolver.refresh_factory_configuration(&name, factory_pid, &event.pid),
            };
            if let Err(e) = outcome {
                failures.push(e);
            }
        }
        collect_failures(failures)
    }
}

impl WorkDispatcher for InstanceProcess {
    fn dispatch(&self, action: WorkAction) {
        let Some(resolver) = self.resolver.upgrade() else {
            warn!(action = action.tag(), "resolver gone; dropping work");
            return;
        };
        debug!(action = action.tag(), items = action.len(), "processing work");
        match action {
            WorkAction::Build(configurations) => self.process_build(&resolver, configurations),
            WorkAction::DynamicBind(references) => self.process_dynamic_bind(&resolver, references),
        }
    }
}

impl ConfigurationListener for InstanceProcess {
    fn configuration_changed(&self, event: &ConfigurationEvent) {
        let Some(resolver) = self.resolver.upgrade() else {
            return;
        };
        if let Err(e) = self.handle_configuration_event(&resolver, event) {
            error!(pid = %event.pid, error = %e, "failed to apply configuration change");
        }
    }
}
