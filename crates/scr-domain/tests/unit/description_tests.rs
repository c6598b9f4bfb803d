//! Unit tests for component descriptions and their validation

use scr_domain::ports::{Component, ComponentFactory};
use scr_domain::{
    Cardinality, ComponentDescription, Properties, ReferenceDescription,
    ServiceDescription,
};
use std::sync::Arc;

struct Noop;

impl Component for Noop {}

fn factory() -> Arc<dyn ComponentFactory> {
    Arc::new(|_: &Properties| -> anyhow::Result<Box<dyn Component>> { Ok(Box::new(Noop)) })
}

// ============================================================================
// Cardinality
// ============================================================================

/// Test cardinality bounds
#[test]
fn test_cardinality_bounds() {
    assert!(!Cardinality::Optional.is_required());
    assert_eq!(Cardinality::Optional.max(), 1);
    assert!(Cardinality::Mandatory.is_required());
    assert_eq!(Cardinality::Mandatory.max(), 1);
    assert!(!Cardinality::Multiple.is_required());
    assert!(Cardinality::AtLeastOne.is_required());
    assert_eq!(Cardinality::AtLeastOne.max(), usize::MAX);
}

/// Test cardinality textual form
#[test]
fn test_cardinality_parse_and_display() {
    for text in ["0..1", "0..n", "1..1", "1..n"] {
        let parsed: Cardinality = text.parse().expect("valid cardinality");
        assert_eq!(parsed.to_string(), text);
    }
    assert!("2..3".parse::<Cardinality>().is_err());
}

// ============================================================================
// Derived flags
// ============================================================================

/// Test that components without a service default to immediate
#[test]
fn test_immediate_is_derived_from_service() {
    let plain = ComponentDescription::new("plain", factory());
    assert!(plain.is_immediate());

    let service = ComponentDescription::new("svc", factory())
        .with_service(ServiceDescription::new(["ILog"]));
    assert!(!service.is_immediate());
    assert!(service.with_immediate(true).is_immediate());
}

/// Test the configuration pid fallback
#[test]
fn test_pid_defaults_to_name() {
    let desc = ComponentDescription::new("logger", factory());
    assert_eq!(desc.pid(), "logger");
    assert_eq!(desc.with_configuration_pid("org.log").pid(), "org.log");
}

// ============================================================================
// Validation
// ============================================================================

/// Test that a well-formed description validates
#[test]
fn test_valid_description() {
    let desc = ComponentDescription::new("svc", factory())
        .with_reference(ReferenceDescription::new("log", "ILog"))
        .with_reference(
            ReferenceDescription::new("audit", "IAudit")
                .with_cardinality(Cardinality::Multiple)
                .dynamic(),
        )
        .with_service(ServiceDescription::new(["IService"]));
    assert!(desc.validate().is_ok());
}

/// Test that an immediate service factory is rejected
#[test]
fn test_immediate_service_factory_rejected() {
    let desc = ComponentDescription::new("svc", factory())
        .with_service(ServiceDescription::new(["IService"]).per_consumer())
        .with_immediate(true);
    assert!(desc.validate().is_err());
}

/// Test that a component factory cannot be a service factory
#[test]
fn test_component_factory_service_factory_rejected() {
    let desc = ComponentDescription::new("svc", factory())
        .with_service(ServiceDescription::new(["IService"]).per_consumer())
        .with_factory("svc.factory");
    assert!(desc.validate().is_err());
}

/// Test that delayed components must provide a service
#[test]
fn test_delayed_without_service_rejected() {
    let desc = ComponentDescription::new("lazy", factory()).with_immediate(false);
    let err = desc.validate().expect_err("delayed without service");
    assert!(err.to_string().contains("lazy"));
}

/// Test that reference names must be unique
#[test]
fn test_duplicate_reference_rejected() {
    let desc = ComponentDescription::new("svc", factory())
        .with_reference(ReferenceDescription::new("log", "ILog"))
        .with_reference(ReferenceDescription::new("log", "IAudit"));
    assert!(desc.validate().is_err());
}

/// Test that empty interfaces are rejected
#[test]
fn test_empty_interface_rejected() {
    let reference = ComponentDescription::new("svc", factory())
        .with_reference(ReferenceDescription::new("log", ""));
    assert!(reference.validate().is_err());

    let service = ComponentDescription::new("svc", factory())
        .with_service(ServiceDescription::new(Vec::<String>::new()));
    assert!(service.validate().is_err());
}
