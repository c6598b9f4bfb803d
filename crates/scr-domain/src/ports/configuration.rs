//! Configuration provider port

use crate::ports::registry::ListenerId;
use crate::value_objects::Properties;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of configuration change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigurationEventKind {
    /// Configuration data was created or replaced
    Updated,
    /// Configuration data was removed
    Deleted,
}

/// Configuration change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationEvent {
    /// PID of the changed configuration
    pub pid: String,
    /// Factory PID when the configuration belongs to a factory
    pub factory_pid: Option<String>,
    /// What happened
    pub kind: ConfigurationEventKind,
}

/// Receives configuration change notifications
pub trait ConfigurationListener: Send + Sync {
    /// Handle one change
    fn configuration_changed(&self, event: &ConfigurationEvent);
}

/// Persistent configuration store contract
///
/// Returned property sets carry `service.pid`, and `service.factoryPid` for
/// factory configurations.
pub trait ConfigurationProvider: Send + Sync {
    /// Singleton configuration data for `pid`
    fn get(&self, pid: &str) -> Option<Properties>;

    /// All factory configurations created for `factory_pid`
    fn list(&self, factory_pid: &str) -> Vec<Properties>;

    /// Subscribe to change notifications
    fn add_configuration_listener(&self, listener: Arc<dyn ConfigurationListener>) -> ListenerId;

    /// Unsubscribe a listener
    fn remove_configuration_listener(&self, id: ListenerId);
}
