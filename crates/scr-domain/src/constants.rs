//! Domain constants
//!
//! Well-known property keys and interface names shared by the engine,
//! the registry adapters and user components.

// ============================================================================
// SERVICE PROPERTY KEYS
// ============================================================================

/// Interfaces a service is registered under
pub const OBJECT_CLASS: &str = "objectClass";

/// Registry-assigned service identifier
pub const SERVICE_ID: &str = "service.id";

/// Provider-supplied ranking; higher wins
pub const SERVICE_RANKING: &str = "service.ranking";

/// Persistent identifier of the configuration backing a service
pub const SERVICE_PID: &str = "service.pid";

/// Factory PID of the configuration backing a factory configuration
pub const SERVICE_FACTORY_PID: &str = "service.factoryPid";

// ============================================================================
// COMPONENT PROPERTY KEYS
// ============================================================================

/// Name of the component description
pub const COMPONENT_NAME: &str = "component.name";

/// Runtime identifier of the component configuration
pub const COMPONENT_ID: &str = "component.id";

/// Factory identifier of a component factory description
pub const COMPONENT_FACTORY: &str = "component.factory";

/// Suffix of the instance property overriding a reference target
pub const TARGET_PROPERTY_SUFFIX: &str = ".target";

/// Prefix of properties that are never propagated to service properties
pub const PRIVATE_PROPERTY_PREFIX: &str = ".";

// ============================================================================
// WELL-KNOWN INTERFACES
// ============================================================================

/// Interface under which component factories are registered
pub const COMPONENT_FACTORY_SERVICE: &str = "scr.ComponentFactory";

/// Default service ranking when none is supplied
pub const DEFAULT_SERVICE_RANKING: i64 = 0;
