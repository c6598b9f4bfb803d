//! Unit tests for the domain error type

use scr_domain::Error;

#[test]
fn test_build_error_display() {
    let err = Error::build("logger", "activate failed");
    assert!(err.is_build_failure());
    assert!(err.to_string().contains("logger"));
}

#[test]
fn test_lifecycle_error_keeps_source() {
    let err = Error::lifecycle("unbind failed", anyhow::anyhow!("boom"));
    assert!(!err.is_build_failure());
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("boom"));
}

#[test]
fn test_not_found_display() {
    let err = Error::not_found("component 7");
    assert!(err.to_string().contains("component 7"));
}

#[test]
fn test_infrastructure_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::WouldBlock, "no threads left");
    let err = Error::infrastructure_with_source("Failed to spawn worker components", io);
    assert!(matches!(err, Error::Infrastructure { source: Some(_), .. }));
    assert!(err.to_string().contains("spawn worker"));
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("no threads left"));
}
