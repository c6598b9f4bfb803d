//! Lifecycle events published by the runtime
//!
//! Events describe state transitions of component configurations. They are
//! informational: subscribers observe transitions, they never drive them.

use crate::value_objects::{ConfigurationId, ServiceId};
use serde::{Deserialize, Serialize};

/// State transition of a component configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentEvent {
    /// A configuration was created for an enabled description
    Enabled {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// Every required reference has a provider
    Satisfied {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// A required reference lost its last provider
    Unsatisfied {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// An instance was built and activated
    Activated {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// Instantiation or activation failed
    ActivationFailed {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
        /// Failure description
        reason: String,
    },
    /// An instance was deactivated and its references unbound
    Deactivated {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// The configuration was removed
    Disposed {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
    /// The provided service was published
    ServiceRegistered {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
        /// Registry id of the service
        service_id: ServiceId,
    },
    /// The provided service was withdrawn
    ServiceUnregistered {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
        /// Registry id of the service
        service_id: ServiceId,
    },
    /// An optional edge of a dependency cycle was marked delay-activate
    CycleBroken {
        /// Consumer holding the note
        consumer: ConfigurationId,
        /// Producer that must not be eagerly activated
        producer: ConfigurationId,
        /// Reference forming the edge
        reference: String,
    },
    /// A configuration in an unbreakable cycle was removed from the enabled set
    CycleRemoved {
        /// Component name
        name: String,
        /// Configuration id
        id: ConfigurationId,
    },
}

impl ComponentEvent {
    /// Configuration the event is about
    pub fn configuration(&self) -> ConfigurationId {
        match self {
            Self::Enabled { id, .. }
            | Self::Satisfied { id, .. }
            | Self::Unsatisfied { id, .. }
            | Self::Activated { id, .. }
            | Self::ActivationFailed { id, .. }
            | Self::Deactivated { id, .. }
            | Self::Disposed { id, .. }
            | Self::ServiceRegistered { id, .. }
            | Self::ServiceUnregistered { id, .. }
            | Self::CycleRemoved { id, .. } => *id,
            Self::CycleBroken { consumer, .. } => *consumer,
        }
    }
}
