use scr_application::ComponentConfiguration;
use scr_domain::constants::{COMPONENT_ID, COMPONENT_NAME, SERVICE_PID};
use scr_domain::ports::Component;
use scr_domain::{
    ComponentDescription, ConfigurationId, Properties, ReferenceDescription, ServiceDescription,
};
use std::sync::Arc;

struct Noop;

impl Component for Noop {}

fn description() -> ComponentDescription {
    let factory = |_: &Properties| -> anyhow::Result<Box<dyn Component>> { Ok(Box::new(Noop)) };
    ComponentDescription::new("greeter", Arc::new(factory))
        .with_property("greeting", "default")
        .with_property("level", 1)
        .with_property(".secret", "hidden")
        .with_reference(ReferenceDescription::new("log", "ILog").with_target("(vendor=a)"))
        .with_service(ServiceDescription::new(["IGreeter"]))
}

#[test]
fn configuration_data_overrides_defaults_and_factory_arguments_override_both() {
    let data = Properties::new()
        .with("greeting", "configured")
        .with(SERVICE_PID, "greeter");
    let extra = Properties::new().with("level", 3);

    let configuration = ComponentConfiguration::new(
        ConfigurationId(7),
        Arc::new(description()),
        Some(&data),
        Some(&extra),
        false,
    )
    .unwrap();

    let properties = configuration.properties();
    assert_eq!(properties.string("greeting"), Some("configured"));
    assert_eq!(properties.i64("level"), Some(3));
    assert_eq!(properties.string(COMPONENT_NAME), Some("greeter"));
    assert_eq!(properties.i64(COMPONENT_ID), Some(7));
    assert_eq!(configuration.pid(), Some("greeter"));
}

#[test]
fn service_properties_exclude_private_keys() {
    let configuration =
        ComponentConfiguration::new(ConfigurationId(1), Arc::new(description()), None, None, false).unwrap();

    assert!(configuration.properties().contains_key(".secret"));
    let published = configuration.service_properties();
    assert!(!published.contains_key(".secret"));
    assert_eq!(published.string("greeting"), Some("default"));
    assert_eq!(configuration.provided_interfaces(), ["IGreeter".to_string()]);
    assert_eq!(configuration.pid(), None);
}

#[test]
fn target_property_from_configuration_data_rewrites_the_filter() {
    let data = Properties::new().with("log.target", "(vendor=b)");
    let configuration =
        ComponentConfiguration::new(ConfigurationId(1), Arc::new(description()), Some(&data), None, false).unwrap();

    let reference = configuration.reference("log").unwrap();
    assert_eq!(reference.target().as_str(), "(vendor=b)");
    assert_eq!(reference.owner(), ConfigurationId(1));
}

#[test]
fn invalid_target_filter_fails_materialization() {
    let data = Properties::new().with("log.target", "(vendor=b");
    let result =
        ComponentConfiguration::new(ConfigurationId(1), Arc::new(description()), Some(&data), None, false);
    assert!(result.is_err());
}

#[test]
fn fresh_configurations_are_active_and_unpublished() {
    let configuration =
        ComponentConfiguration::new(ConfigurationId(1), Arc::new(description()), None, None, false).unwrap();
    assert!(configuration.is_active());
    assert_eq!(configuration.instance_count(), 0);
    assert!(configuration.registration().is_none());
    assert!(configuration.delay_notes().is_empty());
}
