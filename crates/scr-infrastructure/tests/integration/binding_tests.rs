//! Reference binding: ordering, ranking, targets and rebinding

use crate::support::{provide, recorder, settle, start, strings, Journal};
use scr_domain::ports::ServiceRegistry;
use scr_domain::{Cardinality, Properties, ReferenceDescription};

fn reference(name: &str, interface: &str) -> ReferenceDescription {
    ReferenceDescription::new(name, interface).with_methods("bind", "unbind")
}

#[test]
fn references_bind_in_declaration_order_and_unbind_in_reverse() {
    let context = start();
    let journal = Journal::default();
    provide(&context, "I1", "p1", 0);
    provide(&context, "I2", "p2", 0);
    provide(&context, "I3", "p3", 0);

    context
        .runtime()
        .enable([recorder("consumer", &journal)
            .with_reference(reference("r1", "I1"))
            .with_reference(reference("r2", "I2"))
            .with_reference(reference("r3", "I3"))])
        .unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&[
            "consumer:bind:r1=p1",
            "consumer:bind:r2=p2",
            "consumer:bind:r3=p3",
            "consumer:activate",
        ])
    );

    context.runtime().disable(["consumer"]).unwrap();

    assert_eq!(
        journal.take(),
        strings(&[
            "consumer:deactivate",
            "consumer:unbind:r3=p3",
            "consumer:unbind:r2=p2",
            "consumer:unbind:r1=p1",
        ])
    );
}

#[test]
fn highest_ranked_provider_wins() {
    let context = start();
    let journal = Journal::default();
    provide(&context, "ILog", "a", 5);
    provide(&context, "ILog", "b", 10);
    provide(&context, "ILog", "c", 1);

    context
        .runtime()
        .enable([
            recorder("single", &journal).with_reference(reference("log", "ILog")),
            recorder("many", &journal).with_reference(
                reference("log", "ILog").with_cardinality(Cardinality::AtLeastOne),
            ),
        ])
        .unwrap();
    settle(&context);

    let entries = journal.entries();
    let single: Vec<_> = entries.iter().filter(|e| e.starts_with("single:bind")).collect();
    let many: Vec<_> = entries.iter().filter(|e| e.starts_with("many:bind")).collect();
    assert_eq!(single, ["single:bind:log=b"]);
    assert_eq!(many, ["many:bind:log=b", "many:bind:log=a", "many:bind:log=c"]);
}

#[test]
fn target_property_overrides_declared_target() {
    let context = start();
    let journal = Journal::default();
    provide(&context, "ILog", "a", 10);
    provide(&context, "ILog", "b", 1);

    context
        .runtime()
        .enable([recorder("picky", &journal)
            .with_reference(reference("log", "ILog").with_target("(label=a)"))
            .with_property("log.target", "(label=b)")])
        .unwrap();
    settle(&context);

    assert_eq!(journal.take(), strings(&["picky:bind:log=b", "picky:activate"]));
}

#[test]
fn bound_dynamic_provider_is_replaced_before_it_is_unbound() {
    let context = start();
    let journal = Journal::default();
    let a = provide(&context, "ILog", "a", 5);

    context
        .runtime()
        .enable([recorder("consumer", &journal).with_reference(reference("log", "ILog").dynamic())])
        .unwrap();
    settle(&context);
    provide(&context, "ILog", "b", 1);
    settle(&context);

    // A full 1..1 reference does not take the newcomer
    assert_eq!(journal.take(), strings(&["consumer:bind:log=a", "consumer:activate"]));

    context.registry().unregister(a.id()).unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&["consumer:bind:log=b", "consumer:unbind:log=a"])
    );
    let states = context.runtime().states_of("consumer");
    assert!(states[0].satisfied);
    assert_eq!(states[0].instances, 1);
}

#[test]
fn dynamic_multiple_reference_tracks_arrivals_and_departures() {
    let context = start();
    let journal = Journal::default();

    context
        .runtime()
        .enable([recorder("listener", &journal).with_reference(
            reference("log", "ILog")
                .dynamic()
                .with_cardinality(Cardinality::Multiple),
        )])
        .unwrap();
    settle(&context);
    assert_eq!(journal.take(), strings(&["listener:activate"]));

    let a = provide(&context, "ILog", "a", 0);
    provide(&context, "ILog", "b", 0);
    settle(&context);
    context.registry().unregister(a.id()).unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&[
            "listener:bind:log=a",
            "listener:bind:log=b",
            "listener:unbind:log=a",
        ])
    );
}

#[test]
fn modified_provider_no_longer_matching_is_unbound() {
    let context = start();
    let journal = Journal::default();
    let sweet = context
        .registry()
        .register(
            &scr_domain::ConsumerId::new("test-provider"),
            &["ICandy".to_string()],
            scr_domain::ports::ServiceSource::Object(scr_domain::service_object(())),
            Properties::new().with("label", "x").with("flavor", "sweet"),
        )
        .unwrap();

    context
        .runtime()
        .enable([recorder("taster", &journal).with_reference(
            reference("candy", "ICandy")
                .dynamic()
                .with_cardinality(Cardinality::Optional)
                .with_target("(flavor=sweet)"),
        )])
        .unwrap();
    settle(&context);

    context
        .registry()
        .set_properties(sweet.id(), Properties::new().with("label", "x").with("flavor", "sour"))
        .unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&["taster:bind:candy=x", "taster:activate", "taster:unbind:candy=x"])
    );
    assert_eq!(context.runtime().states_of("taster")[0].instances, 1);
}

#[test]
fn static_reference_rebuilds_when_its_provider_leaves() {
    let context = start();
    let journal = Journal::default();
    let a = provide(&context, "ILog", "a", 5);
    provide(&context, "ILog", "b", 1);

    context
        .runtime()
        .enable([recorder("consumer", &journal).with_reference(reference("log", "ILog"))])
        .unwrap();
    settle(&context);
    assert_eq!(journal.take(), strings(&["consumer:bind:log=a", "consumer:activate"]));

    context.registry().unregister(a.id()).unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&[
            "consumer:deactivate",
            "consumer:unbind:log=a",
            "consumer:bind:log=b",
            "consumer:activate",
        ])
    );
}

#[test]
fn losing_the_last_provider_disposes_the_consumer() {
    let context = start();
    let journal = Journal::default();
    let a = provide(&context, "ILog", "a", 0);

    context
        .runtime()
        .enable([recorder("consumer", &journal).with_reference(reference("log", "ILog").dynamic())])
        .unwrap();
    settle(&context);
    journal.take();

    context.registry().unregister(a.id()).unwrap();
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&["consumer:deactivate", "consumer:unbind:log=a"])
    );
    let state = &context.runtime().states_of("consumer")[0];
    assert!(!state.satisfied);
    assert_eq!(state.instances, 0);

    // Returns once a provider is back
    provide(&context, "ILog", "b", 0);
    settle(&context);
    assert_eq!(journal.take(), strings(&["consumer:bind:log=b", "consumer:activate"]));
}
