//! Component factories

use crate::support::{recorder, settle, start, strings, Journal};
use scr_application::ComponentFactoryService;
use scr_domain::constants::{COMPONENT_FACTORY, COMPONENT_FACTORY_SERVICE};
use scr_domain::ports::ServiceRegistry;
use scr_domain::{ConsumerId, Filter, Properties, ServiceDescription, downcast_service};
use scr_infrastructure::RuntimeContext;
use std::sync::Arc;

fn factory_service(context: &RuntimeContext, id: &str) -> Option<Arc<ComponentFactoryService>> {
    let filter = Filter::parse(&format!("({COMPONENT_FACTORY}={id})")).ok()?;
    let reference = context
        .registry()
        .query(COMPONENT_FACTORY_SERVICE, Some(&filter))
        .into_iter()
        .next()?;
    let object = context.registry().acquire(&reference, &ConsumerId::new("factory-user"))?;
    downcast_service::<ComponentFactoryService>(&object)
}

#[test]
fn satisfied_factory_registers_a_factory_service_without_building() {
    let context = start();
    let journal = Journal::default();

    context
        .runtime()
        .enable([recorder("widget", &journal)
            .with_factory("widget.factory")
            .with_service(ServiceDescription::new(["IWidget"]))])
        .unwrap();
    settle(&context);

    let factory = factory_service(&context, "widget.factory").expect("factory service");
    assert_eq!(factory.factory_id(), "widget.factory");
    assert_eq!(factory.component_name(), "widget");
    assert!(journal.entries().is_empty());
    assert!(context.registry().query("IWidget", None).is_empty());
}

#[test]
fn new_instance_builds_and_dispose_tears_down() {
    let context = start();
    let journal = Journal::default();
    context
        .runtime()
        .enable([recorder("widget", &journal)
            .with_property("size", 1)
            .with_factory("widget.factory")
            .with_service(ServiceDescription::new(["IWidget"]))])
        .unwrap();
    settle(&context);
    let factory = factory_service(&context, "widget.factory").expect("factory service");

    let handle = factory.new_instance(Properties::new().with("size", 3)).unwrap();

    assert_eq!(handle.properties().i64("size"), Some(3));
    assert!(handle.service().is_some());
    assert_eq!(journal.take(), strings(&["widget:activate"]));
    let widgets = context.registry().query("IWidget", None);
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].properties().i64("size"), Some(3));
    assert!(
        context
            .runtime()
            .states_of("widget")
            .iter()
            .any(|s| s.factory_instance && s.instances == 1)
    );

    handle.dispose();

    assert!(handle.is_disposed());
    assert_eq!(journal.take(), strings(&["widget:deactivate"]));
    assert!(context.registry().query("IWidget", None).is_empty());
    assert!(!context.runtime().is_enabled(handle.configuration_id()));
}

#[test]
fn disabling_the_factory_disposes_its_instances() {
    let context = start();
    let journal = Journal::default();
    context
        .runtime()
        .enable([recorder("widget", &journal).with_factory("widget.factory")])
        .unwrap();
    settle(&context);
    let factory = factory_service(&context, "widget.factory").expect("factory service");

    let first = factory.new_instance(Properties::new()).unwrap();
    let second = factory.new_instance(Properties::new()).unwrap();
    assert_ne!(first.configuration_id(), second.configuration_id());

    context.runtime().disable(["widget"]).unwrap();

    assert!(first.is_disposed() && second.is_disposed());
    let deactivations = journal.entries().iter().filter(|e| *e == "widget:deactivate").count();
    assert_eq!(deactivations, 2);
    assert!(factory.new_instance(Properties::new()).is_err());
}
