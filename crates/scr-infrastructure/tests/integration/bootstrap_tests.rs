//! Composition root

use crate::support::{Journal, RecorderFactory, settle, start_with, strings};
use scr_domain::ComponentDescription;
use scr_domain::Properties;
use scr_domain::ports::ConfigurationProvider;
use scr_infrastructure::config::{FactoryConfigurationSeed, ScrConfig};
use scr_infrastructure::constants::FACTORY_PID_SEPARATOR;
use scr_infrastructure::init_runtime;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn seeded_config() -> ScrConfig {
    let mut configurations = BTreeMap::new();
    configurations.insert("greeter".to_string(), Properties::new().with("greeting", "seeded"));
    ScrConfig {
        configurations,
        factory_configurations: vec![
            FactoryConfigurationSeed {
                factory_pid: "worker".to_string(),
                properties: Properties::new().with("greeting", "first"),
            },
            FactoryConfigurationSeed {
                factory_pid: "worker".to_string(),
                properties: Properties::new().with("greeting", "second"),
            },
        ],
        ..ScrConfig::default()
    }
}

fn watching(name: &str, journal: &Journal) -> ComponentDescription {
    ComponentDescription::new(name, RecorderFactory::new(name, journal).watching("greeting").shared())
}

#[test]
fn seeds_the_configuration_store() {
    let context = start_with(seeded_config());
    let store = context.configurations();

    assert_eq!(
        store.get("greeter").and_then(|p| p.string("greeting").map(str::to_string)),
        Some("seeded".to_string())
    );
    assert_eq!(store.list("worker").len(), 2);
    assert!(store.get("worker").is_none());
    assert!(
        store
            .pids()
            .iter()
            .filter(|pid| pid.as_str() != "greeter")
            .all(|pid| pid.starts_with(&format!("worker{FACTORY_PID_SEPARATOR}")))
    );
    assert_eq!(context.config.factory_configurations.len(), 2);
}

#[test]
fn seeded_configurations_reach_components() {
    let context = start_with(seeded_config());
    let journal = Journal::default();
    context
        .runtime()
        .enable([watching("greeter", &journal), watching("worker", &journal)])
        .unwrap();
    settle(&context);

    let mut entries = journal.take();
    entries.sort();
    assert_eq!(
        entries,
        strings(&[
            "greeter:activate:seeded",
            "worker:activate:first",
            "worker:activate:second",
        ])
    );
    assert_eq!(context.runtime().states_of("worker").len(), 2);
}

#[test]
fn shutdown_deactivates_everything() {
    let context = start_with(ScrConfig::default());
    let journal = Journal::default();
    context.runtime().enable([watching("greeter", &journal)]).unwrap();
    settle(&context);
    assert_eq!(journal.take(), strings(&["greeter:activate:-"]));

    context.shutdown();

    assert_eq!(journal.take(), strings(&["greeter:deactivate"]));
    assert!(context.runtime().component_states().is_empty());
    assert_eq!(context.registry().service_count(), 0);
}

// The only test in this binary that lets the context own the subscriber.
#[test]
fn logging_section_installs_the_subscriber() {
    let dir = TempDir::new().unwrap();
    let mut config = ScrConfig::default();
    config.logging.file_output = Some(dir.path().join("scr-test.log"));

    let context = init_runtime(config).unwrap();
    assert!(context.owns_logging());
    assert!(context.writes_log_file());
    assert!(tracing::dispatcher::has_been_set());

    let journal = Journal::default();
    context.runtime().enable([watching("greeter", &journal)]).unwrap();
    settle(&context);
    context.shutdown();
    drop(context);

    let written: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(written.iter().any(|name| name.starts_with("scr-test")), "{written:?}");
}

#[test]
fn disabled_logging_leaves_the_subscriber_alone() {
    let mut config = ScrConfig::default();
    config.logging.enabled = false;
    config.logging.level = "loud".to_string();

    let context = init_runtime(config).unwrap();
    assert!(!context.owns_logging());
    assert!(!context.writes_log_file());
    context.shutdown();
}
