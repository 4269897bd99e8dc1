// crates/studykeep-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Loading and validation coverage for the gateway config.
// Purpose: Prove defaults are valid and invalid knobs fail closed.
// ============================================================================

//! ## Overview
//! Covers default validity, TOML override loading, and the fail-closed
//! rejection of out-of-range or inconsistent settings.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;

use studykeep_config::AuditSinkType;
use studykeep_config::ConfigError;
use studykeep_config::StudykeepConfig;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Writes a TOML document to a temp file and loads it.
fn load_toml(content: &str) -> Result<StudykeepConfig, ConfigError> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    StudykeepConfig::load(Some(file.path()))
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn defaults_are_valid() {
    let config = StudykeepConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.server.bind, "127.0.0.1:8080");
    assert_eq!(config.retrieval.history_limit, 100);
    assert_eq!(config.audit.sink, AuditSinkType::Stderr);
    assert_eq!(config.transport.api_base, "https://api.telegram.org");
}

#[test]
fn empty_document_yields_defaults() {
    let config = load_toml("").unwrap();
    assert_eq!(config.server.max_body_bytes, 256 * 1024);
    assert!(!config.transport.allow_http);
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

#[test]
fn toml_overrides_apply_per_section() {
    let config = load_toml(
        r#"
        [server]
        bind = "0.0.0.0:9100"
        max_body_bytes = 65536

        [retrieval]
        history_limit = 50

        [audit]
        sink = "noop"
        "#,
    )
    .unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:9100");
    assert_eq!(config.server.max_body_bytes, 65536);
    assert_eq!(config.retrieval.history_limit, 50);
    assert_eq!(config.audit.sink, AuditSinkType::Noop);
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn invalid_bind_address_is_rejected() {
    let err = load_toml("[server]\nbind = \"not-an-address\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn zero_history_limit_is_rejected() {
    let err = load_toml("[retrieval]\nhistory_limit = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn oversized_history_limit_is_rejected() {
    let err = load_toml("[retrieval]\nhistory_limit = 100000\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn undersized_body_limit_is_rejected() {
    let err = load_toml("[server]\nmax_body_bytes = 16\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn transport_timeout_bounds_are_enforced() {
    let err = load_toml("[transport]\ntimeout_ms = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn file_audit_sink_requires_path() {
    let err = load_toml("[audit]\nsink = \"file\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = load_toml("[server]\nbindd = \"127.0.0.1:1\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_named_file_is_an_io_error() {
    let err = StudykeepConfig::load(Some(std::path::Path::new("/nonexistent/studykeep.toml")))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
