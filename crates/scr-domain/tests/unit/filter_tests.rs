//! Unit tests for target filter evaluation

use scr_domain::{Filter, Properties};
use serde_json::json;

fn props() -> Properties {
    Properties::new()
        .with("objectClass", json!(["ILog", "IAudit"]))
        .with("vendor", "Acme Corp")
        .with("level", 3)
        .with("enabled", true)
}

#[test]
fn test_composite_filter() {
    let filter = Filter::parse("(&(objectClass=ILog)(|(level>=5)(vendor=Acme*)))").expect("parse");
    assert!(filter.matches(&props()));

    let filter = Filter::parse("(&(objectClass=ILog)(!(enabled=true)))").expect("parse");
    assert!(!filter.matches(&props()));
}

#[test]
fn test_attribute_names_are_case_insensitive() {
    let filter = Filter::parse("(VENDOR=Acme Corp)").expect("parse");
    assert!(filter.matches(&props()));
}

#[test]
fn test_presence_and_approx() {
    assert!(Filter::parse("(level=*)").expect("parse").matches(&props()));
    assert!(!Filter::parse("(missing=*)").expect("parse").matches(&props()));
    assert!(Filter::parse("(vendor~=acmecorp)").expect("parse").matches(&props()));
}

#[test]
fn test_numeric_comparison() {
    assert!(Filter::parse("(level<=3)").expect("parse").matches(&props()));
    assert!(!Filter::parse("(level>=4)").expect("parse").matches(&props()));
}

#[test]
fn test_object_class_filter_escapes() {
    let filter = Filter::object_class("weird(name)");
    let props = Properties::new().with("objectClass", "weird(name)");
    assert!(filter.matches(&props));
}

#[test]
fn test_filter_round_trips_through_serde() {
    let filter = Filter::parse("(a=b)").expect("parse");
    let json = serde_json::to_string(&filter).expect("serialize");
    assert_eq!(json, r#""(a=b)""#);
    let back: Filter = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, filter);
}
