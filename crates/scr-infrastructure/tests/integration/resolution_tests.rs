//! Resolution results and introspection

use crate::support::{Journal, provide, recorder, settle, start, strings};
use parking_lot::Mutex;
use scr_domain::constants::COMPONENT_ID;
use scr_domain::ports::{Component, ComponentContext, ServiceRegistry};
use scr_domain::{
    Cardinality, ComponentDescription, ConsumerId, Properties, ReferenceDescription, ServiceDescription,
    downcast_service,
};
use std::sync::Arc;

#[test]
fn resolve_is_idempotent() {
    let context = start();
    let journal = Journal::default();
    provide(&context, "ILog", "log", 0);
    context
        .runtime()
        .enable([
            recorder("first", &journal).with_reference(ReferenceDescription::new("log", "ILog")),
            recorder("second", &journal).with_reference(ReferenceDescription::new("missing", "IMissing")),
        ])
        .unwrap();
    settle(&context);

    let once = context.runtime().resolve();
    let twice = context.runtime().resolve();
    settle(&context);

    assert_eq!(once, twice);
    assert_eq!(once.len(), 1);
    assert_eq!(journal.entries(), strings(&["first:activate"]));
}

#[test]
fn satisfied_configurations_are_enabled() {
    let context = start();
    let journal = Journal::default();
    provide(&context, "ILog", "log", 0);
    context
        .runtime()
        .enable([
            recorder("a", &journal).with_reference(ReferenceDescription::new("log", "ILog")),
            recorder("b", &journal).with_reference(ReferenceDescription::new("missing", "IMissing")),
            recorder("c", &journal),
        ])
        .unwrap();
    settle(&context);

    let enabled = context.runtime().enabled_ids();
    let satisfied = context.runtime().satisfied_ids();
    assert_eq!(enabled.len(), 3);
    assert_eq!(satisfied.len(), 2);
    assert!(satisfied.iter().all(|id| enabled.contains(id)));

    let b = &context.runtime().states_of("b")[0];
    assert!(!b.satisfied);
    assert!(context.runtime().is_enabled(b.id));
    assert!(!context.runtime().is_satisfied(b.id));
}

#[test]
fn states_describe_registered_services() {
    let context = start();
    let journal = Journal::default();
    context
        .runtime()
        .enable([recorder("provider", &journal)
            .with_service(ServiceDescription::new(["IProvider"]))
            .with_immediate(true)])
        .unwrap();
    settle(&context);

    let state = &context.runtime().states_of("provider")[0];
    assert!(state.satisfied);
    assert_eq!(state.instances, 1);
    assert!(!state.factory_instance);
    assert!(state.delay_notes.is_empty());

    let service_id = state.service_id.expect("service registered");
    let reference = context.registry().reference(service_id).expect("still registered");
    assert_eq!(reference.component(), Some(state.id));
    assert_eq!(reference.properties().i64(COMPONENT_ID), Some(state.id.0 as i64));

    let json = serde_json::to_value(state).unwrap();
    assert_eq!(json["name"], "provider");
}

struct Locator {
    found: Arc<Mutex<Vec<String>>>,
}

impl Component for Locator {
    fn activate(&mut self, context: &dyn ComponentContext) -> anyhow::Result<()> {
        let mut found = self.found.lock();
        if let Some(best) = context.locate_service("log") {
            let label = downcast_service::<String>(&best).expect("string service");
            found.push(format!("best={label}"));
        }
        found.push(format!("all={}", context.locate_services("log").len()));
        found.push(format!("undeclared={}", context.locate_service("other").is_some()));
        Ok(())
    }
}

#[test]
fn context_locates_services_for_declared_references() {
    let context = start();
    provide(&context, "ILog", "quiet", 1);
    let loud = provide(&context, "ILog", "loud", 10);

    let found = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&found);
    let factory = move |_: &Properties| -> anyhow::Result<Box<dyn Component>> {
        Ok(Box::new(Locator { found: Arc::clone(&sink) }))
    };
    context
        .runtime()
        .enable([ComponentDescription::new("locator", Arc::new(factory)).with_reference(
            ReferenceDescription::new("log", "ILog").with_cardinality(Cardinality::AtLeastOne),
        )])
        .unwrap();
    settle(&context);

    assert_eq!(
        *found.lock(),
        strings(&["best=loud", "all=2", "undeclared=false"])
    );
    let owner = ConsumerId::new("locator");
    // One acquisition per locate call, all released on deactivation
    assert_eq!(context.registry().usage_count(loud.id(), &owner), 2);

    context.runtime().disable(["locator"]).unwrap();
    assert_eq!(context.registry().usage_count(loud.id(), &owner), 0);
}
