//! Dependency cycles

use crate::support::{Journal, drain, recorder, settle, start, strings};
use scr_domain::{Cardinality, ComponentEvent, ReferenceDescription, ServiceDescription};

#[test]
fn optional_edge_breaks_the_cycle_and_both_components_run() {
    let context = start();
    let journal = Journal::default();
    let mut events = context.runtime().subscribe();

    context
        .runtime()
        .enable([
            recorder("a", &journal)
                .with_service(ServiceDescription::new(["IA"]))
                .with_immediate(true)
                .with_reference(ReferenceDescription::new("b", "IB").with_methods("bind", "unbind")),
            recorder("b", &journal)
                .with_service(ServiceDescription::new(["IB"]))
                .with_reference(
                    ReferenceDescription::new("a", "IA")
                        .with_cardinality(Cardinality::Optional)
                        .dynamic()
                        .with_methods("bind", "unbind"),
                ),
        ])
        .unwrap();
    settle(&context);

    let a = context.runtime().states_of("a").remove(0);
    let b = context.runtime().states_of("b").remove(0);
    assert_eq!(b.delay_notes, vec![a.id]);
    assert!(a.delay_notes.is_empty());
    assert!(a.satisfied && b.satisfied);
    assert_eq!(a.instances, 1);
    assert_eq!(b.instances, 1);

    let entries = journal.entries();
    assert!(entries.contains(&"a:activate".to_string()));
    assert!(entries.contains(&"b:activate".to_string()));
    // b acquires a once a registers its service
    assert!(entries.iter().any(|e| e.starts_with("b:bind:a=")));
    assert!(entries.iter().any(|e| e.starts_with("a:bind:b=")));

    let broken = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ComponentEvent::CycleBroken { .. }))
        .count();
    assert_eq!(broken, 1);
}

#[test]
fn required_cycle_removes_exactly_one_configuration() {
    let context = start();
    let journal = Journal::default();
    let mut events = context.runtime().subscribe();

    context
        .runtime()
        .enable([
            recorder("a", &journal)
                .with_service(ServiceDescription::new(["IA"]))
                .with_reference(ReferenceDescription::new("b", "IB")),
            recorder("b", &journal)
                .with_service(ServiceDescription::new(["IB"]))
                .with_reference(ReferenceDescription::new("a", "IA")),
        ])
        .unwrap();
    settle(&context);

    assert_eq!(context.runtime().enabled_ids().len(), 1);
    assert!(context.runtime().satisfied_ids().is_empty());
    let removed: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ComponentEvent::CycleRemoved { .. }))
        .collect();
    assert_eq!(removed.len(), 1);
    assert!(journal.entries().is_empty());
}

#[test]
fn bind_into_a_delayed_producer_is_deferred_until_the_outer_build_returns() {
    let context = start();
    let journal = Journal::default();

    // c pulls in a, a pulls in b, and b must not re-enter a mid-build
    context
        .runtime()
        .enable([
            recorder("a", &journal)
                .with_service(ServiceDescription::new(["IA"]))
                .with_reference(ReferenceDescription::new("b", "IB").with_methods("bind", "unbind")),
            recorder("b", &journal)
                .with_service(ServiceDescription::new(["IB"]))
                .with_reference(
                    ReferenceDescription::new("a", "IA")
                        .with_cardinality(Cardinality::Optional)
                        .dynamic()
                        .with_methods("bind", "unbind"),
                ),
            recorder("c", &journal)
                .with_reference(ReferenceDescription::new("a", "IA").with_methods("bind", "unbind")),
        ])
        .unwrap();
    settle(&context);

    let entries = journal.entries();
    assert_eq!(
        entries,
        strings(&[
            "b:activate",
            "a:bind:b=1",
            "a:activate",
            "c:bind:a=2",
            "c:activate",
            "b:bind:a=2",
        ])
    );
    let position = |entry: &str| entries.iter().position(|e| e == entry);
    assert!(position("b:bind:a=2") > position("a:activate"));

    let a = context.runtime().states_of("a").remove(0);
    let b = context.runtime().states_of("b").remove(0);
    assert_eq!(b.delay_notes, vec![a.id]);
    assert_eq!(a.instances, 1);
    assert_eq!(b.instances, 1);
    assert_eq!(context.runtime().resolver().process().build().stack_count(), 0);
}
