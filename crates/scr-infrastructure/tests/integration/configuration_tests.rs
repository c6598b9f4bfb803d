//! Configuration policies and configuration changes

use crate::support::{Journal, RecorderFactory, recorder, settle, start, strings};
use scr_domain::error::Error;
use scr_domain::{ComponentDescription, ConfigurationPolicy, Properties};

fn configured(journal: &Journal, policy: ConfigurationPolicy) -> ComponentDescription {
    ComponentDescription::new(
        "configured",
        RecorderFactory::new("configured", journal).watching("greeting").shared(),
    )
    .with_property("greeting", "default")
    .with_configuration_policy(policy)
}

#[test]
fn configuration_change_rebuilds_with_new_properties() {
    let context = start();
    let journal = Journal::default();
    context
        .runtime()
        .enable([configured(&journal, ConfigurationPolicy::Optional)])
        .unwrap();
    settle(&context);
    assert_eq!(journal.take(), strings(&["configured:activate:default"]));
    assert_eq!(context.runtime().states_of("configured")[0].pid, None);

    context
        .configurations()
        .update("configured", Properties::new().with("greeting", "hello"));
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&["configured:deactivate", "configured:activate:hello"])
    );
    assert_eq!(
        context.runtime().states_of("configured")[0].pid.as_deref(),
        Some("configured")
    );

    // Deletion under the optional policy falls back to the declared defaults
    context.configurations().delete("configured");
    settle(&context);

    assert_eq!(
        journal.take(),
        strings(&["configured:deactivate", "configured:activate:default"])
    );
    assert_eq!(context.runtime().states_of("configured")[0].pid, None);
}

#[test]
fn required_configuration_gates_creation() {
    let context = start();
    let journal = Journal::default();
    context
        .runtime()
        .enable([configured(&journal, ConfigurationPolicy::Require)])
        .unwrap();
    settle(&context);
    assert!(context.runtime().states_of("configured").is_empty());

    context
        .configurations()
        .update("configured", Properties::new().with("greeting", "present"));
    settle(&context);
    assert_eq!(journal.take(), strings(&["configured:activate:present"]));

    context.configurations().delete("configured");
    settle(&context);
    assert_eq!(journal.take(), strings(&["configured:deactivate"]));
    assert!(context.runtime().states_of("configured").is_empty());
}

#[test]
fn ignore_policy_never_reads_configuration_data() {
    let context = start();
    let journal = Journal::default();
    context
        .configurations()
        .update("configured", Properties::new().with("greeting", "ignored"));

    context
        .runtime()
        .enable([configured(&journal, ConfigurationPolicy::Ignore)])
        .unwrap();
    settle(&context);
    context
        .configurations()
        .update("configured", Properties::new().with("greeting", "still ignored"));
    settle(&context);

    assert_eq!(journal.take(), strings(&["configured:activate:default"]));
}

#[test]
fn configuration_pid_can_differ_from_the_name() {
    let context = start();
    let journal = Journal::default();
    context
        .configurations()
        .update("shared.settings", Properties::new().with("greeting", "from pid"));

    context
        .runtime()
        .enable([configured(&journal, ConfigurationPolicy::Optional).with_configuration_pid("shared.settings")])
        .unwrap();
    settle(&context);

    assert_eq!(journal.take(), strings(&["configured:activate:from pid"]));
}

#[test]
fn factory_configurations_create_one_configuration_each() {
    let context = start();
    let journal = Journal::default();
    let store = context.configurations();
    store.create_factory_configuration("configured", Properties::new().with("greeting", "one"));
    store.create_factory_configuration("configured", Properties::new().with("greeting", "two"));

    context
        .runtime()
        .enable([configured(&journal, ConfigurationPolicy::Optional)])
        .unwrap();
    settle(&context);

    let mut entries = journal.take();
    entries.sort();
    assert_eq!(
        entries,
        strings(&["configured:activate:one", "configured:activate:two"])
    );

    let third = store.create_factory_configuration("configured", Properties::new().with("greeting", "three"));
    settle(&context);
    assert_eq!(journal.take(), strings(&["configured:activate:three"]));
    assert_eq!(context.runtime().states_of("configured").len(), 3);

    store.delete(&third);
    settle(&context);
    assert_eq!(journal.take(), strings(&["configured:deactivate"]));
    assert_eq!(context.runtime().states_of("configured").len(), 2);
}

#[test]
fn conflicting_configuration_sources_fail_that_description() {
    let context = start();
    let journal = Journal::default();
    let store = context.configurations();
    store.update("configured", Properties::new());
    store.create_factory_configuration("configured", Properties::new());

    let result = context.runtime().enable([
        configured(&journal, ConfigurationPolicy::Optional),
        recorder("bystander", &journal),
    ]);
    settle(&context);

    assert!(matches!(result, Err(Error::Configuration { .. })));
    assert!(context.runtime().states_of("configured").is_empty());
    assert_eq!(journal.entries(), strings(&["bystander:activate"]));
}
