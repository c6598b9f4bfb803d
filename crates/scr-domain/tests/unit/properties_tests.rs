//! Unit tests for property sets

use scr_domain::Properties;
use scr_domain::constants::{OBJECT_CLASS, SERVICE_RANKING};
use serde_json::json;

#[test]
fn test_merge_overlays_right_hand_side() {
    let defaults = Properties::new().with("a", 1).with("b", "x");
    let overrides = Properties::new().with("b", "y").with("c", true);

    let merged = defaults.merged(&overrides);

    assert_eq!(merged.i64("a"), Some(1));
    assert_eq!(merged.string("b"), Some("y"));
    assert_eq!(merged.get("c"), Some(&json!(true)));
    // Source sets are untouched
    assert_eq!(defaults.string("b"), Some("x"));
}

#[test]
fn test_public_drops_private_keys() {
    let props = Properties::new().with(".secret", "s").with("visible", 1);

    let public = props.public();

    assert!(!public.contains_key(".secret"));
    assert!(public.contains_key("visible"));
    assert_eq!(public.len(), 1);
}

#[test]
fn test_ranking_defaults_to_zero() {
    assert_eq!(Properties::new().ranking(), 0);
    assert_eq!(Properties::new().with(SERVICE_RANKING, 7).ranking(), 7);
    assert_eq!(Properties::new().with(SERVICE_RANKING, "high").ranking(), 0);
}

#[test]
fn test_object_class_accepts_string_or_array() {
    let single = Properties::new().with(OBJECT_CLASS, "ILog");
    let many = Properties::new().with(OBJECT_CLASS, json!(["ILog", "IAudit"]));

    assert_eq!(single.object_class(), vec!["ILog".to_string()]);
    assert!(many.implements("IAudit"));
    assert!(!many.implements("IOther"));
}

#[test]
fn test_get_ignore_case() {
    let props = Properties::new().with("Vendor", "acme");

    assert_eq!(props.get_ignore_case("vendor"), Some(&json!("acme")));
    assert_eq!(props.get("vendor"), None);
}

#[test]
fn test_properties_serialize_as_plain_map() {
    let props = Properties::new().with("a", 1);
    let json = serde_json::to_string(&props).expect("serialize");
    assert_eq!(json, r#"{"a":1}"#);

    let back: Properties = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, props);
}
