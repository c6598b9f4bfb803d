//! Unit tests for component lifecycle events

use scr_domain::{ComponentEvent, ConfigurationId};

#[test]
fn test_event_serialization_is_tagged() {
    let event = ComponentEvent::Activated {
        name: "logger".to_string(),
        id: ConfigurationId(3),
    };
    let value = serde_json::to_value(&event).expect("serialize");

    assert_eq!(value["type"], "activated");
    assert_eq!(value["name"], "logger");
    assert_eq!(value["id"], 3);
}

#[test]
fn test_event_configuration_accessor() {
    let broken = ComponentEvent::CycleBroken {
        consumer: ConfigurationId(2),
        producer: ConfigurationId(1),
        reference: "a".to_string(),
    };
    assert_eq!(broken.configuration(), ConfigurationId(2));
}
