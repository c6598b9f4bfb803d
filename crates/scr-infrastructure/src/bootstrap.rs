//! Composition root
//!
//! Installs logging, builds the in-memory registry and configuration store,
//! seeds the store from [`ScrConfig`] and starts a [`ServiceComponentRuntime`]
//! wired to both.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().load()?;
//! let context = init_runtime(config)?;
//! context.runtime().enable([description])?;
//! context.runtime().shutdown();
//! ```

use crate::adapters::{InMemoryConfigurationStore, InMemoryServiceRegistry};
use crate::config::ScrConfig;
use crate::logging::{LoggingGuard, try_init_logging};
use scr_application::ServiceComponentRuntime;
use scr_domain::error::Result;
use scr_domain::ports::{ConfigurationProvider, ServiceRegistry};
use std::sync::Arc;
use tracing::info;

/// A started runtime and the adapters it consumes
pub struct RuntimeContext {
    /// Configuration the runtime was started with
    pub config: Arc<ScrConfig>,
    registry: Arc<InMemoryServiceRegistry>,
    configurations: Arc<InMemoryConfigurationStore>,
    runtime: ServiceComponentRuntime,
    logging: Option<LoggingGuard>,
}

impl RuntimeContext {
    /// The runtime
    pub fn runtime(&self) -> &ServiceComponentRuntime {
        &self.runtime
    }

    /// The service registry
    pub fn registry(&self) -> Arc<InMemoryServiceRegistry> {
        Arc::clone(&self.registry)
    }

    /// The configuration store
    pub fn configurations(&self) -> Arc<InMemoryConfigurationStore> {
        Arc::clone(&self.configurations)
    }

    /// True if this context installed the global log subscriber
    pub fn owns_logging(&self) -> bool {
        self.logging.is_some()
    }

    /// True if this context keeps a log file writer alive
    pub fn writes_log_file(&self) -> bool {
        self.logging.as_ref().is_some_and(LoggingGuard::writes_file)
    }

    /// Disable every component and stop the worker
    pub fn shutdown(&self) {
        self.runtime.shutdown();
    }
}

/// Install logging, seed the adapters from `config` and start the runtime
///
/// Logging is skipped when `logging.enabled` is false or another subscriber
/// is already installed.
pub fn init_runtime(config: ScrConfig) -> Result<RuntimeContext> {
    let logging = if config.logging.enabled {
        try_init_logging(&config.logging)?
    } else {
        None
    };

    let registry = Arc::new(InMemoryServiceRegistry::new());
    let configurations = Arc::new(InMemoryConfigurationStore::new());
    seed_configurations(&configurations, &config);

    let runtime = ServiceComponentRuntime::start(
        Arc::clone(&registry) as Arc<dyn ServiceRegistry>,
        Some(Arc::clone(&configurations) as Arc<dyn ConfigurationProvider>),
        config.runtime.options(),
    )?;

    info!(
        configurations = config.configurations.len(),
        factory_configurations = config.factory_configurations.len(),
        "runtime context initialized"
    );
    Ok(RuntimeContext {
        config: Arc::new(config),
        registry,
        configurations,
        runtime,
        logging,
    })
}

fn seed_configurations(store: &InMemoryConfigurationStore, config: &ScrConfig) {
    for (pid, properties) in &config.configurations {
        store.update(pid, properties.clone());
    }
    for seed in &config.factory_configurations {
        store.create_factory_configuration(&seed.factory_pid, seed.properties.clone());
    }
}
