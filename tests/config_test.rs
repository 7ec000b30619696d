//! Comprehensive unit tests for config.rs module

use std::io::Write;
use std::time::Duration;

use auditor_dashboard::config::AppConfig;

#[test]
fn test_default_api_config() {
    let config = AppConfig::default();

    assert!(config.api.use_mock);
    assert_eq!(config.api.base_url, "https://api.example.com");
    assert_eq!(config.api.timeout_secs, 30);
}

#[test]
fn test_default_mock_config() {
    let config = AppConfig::default();

    assert_eq!(config.mock.latency_ms, 300);
    assert_eq!(config.mock.regenerate_latency_ms, 500);
    assert!(config.mock.failure_rate.abs() < f64::EPSILON);
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_knowledge_and_dashboard_config() {
    let config = AppConfig::default();

    assert_eq!(config.knowledge.accepted_types, vec![".txt"]);
    assert_eq!(config.dashboard.recent_activity_limit, 4);
    assert_eq!(config.auditor.id, "auditor-1");
}

#[test]
fn test_config_validation_success() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_zero_timeout() {
    let mut config = AppConfig::default();
    config.api.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_failure_rate_out_of_range() {
    let mut config = AppConfig::default();
    config.mock.failure_rate = 1.5;
    assert!(config.validate().is_err());

    config.mock.failure_rate = -0.1;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_empty_auditor() {
    let mut config = AppConfig::default();
    config.auditor.id = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_malformed_accepted_type() {
    let mut config = AppConfig::default();
    config.knowledge.accepted_types = vec!["pdf".to_string()];
    assert!(config.validate().is_err());

    config.knowledge.accepted_types = Vec::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_zero_activity_limit() {
    let mut config = AppConfig::default();
    config.dashboard.recent_activity_limit = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_real_backend_needs_http_url() {
    let mut config = AppConfig::default();
    config.api.use_mock = false;
    config.api.base_url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    config.api.base_url = "http://localhost:8080".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "invalid".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_valid_log_levels() {
    let valid_levels = vec!["trace", "debug", "info", "warn", "error"];
    for level in valid_levels {
        let mut config = AppConfig::default();
        config.logging.level = level.to_string();
        assert!(config.validate().is_ok(), "Failed for level: {}", level);
    }
}

#[test]
fn test_config_validation_invalid_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_mock_behavior_from_config() {
    let mut config = AppConfig::default();
    config.mock.latency_ms = 10;
    config.mock.failure_rate = 0.25;

    let behavior = config.mock_behavior();
    assert_eq!(behavior.latency, Duration::from_millis(10));
    assert_eq!(behavior.regenerate_latency, Duration::from_millis(500));
    assert!((behavior.failure_rate - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_to_yaml_renders_sections() {
    let yaml = AppConfig::default().to_yaml().unwrap();
    assert!(yaml.contains("use_mock: true"));
    assert!(yaml.contains("recent_activity_limit: 4"));
    assert!(yaml.contains("- .txt"));
}

#[test]
fn test_load_merges_file_over_defaults() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "auditor:\n  id: auditor-7\nknowledge:\n  accepted_types:\n    - .pdf\n    - .docx\nmock:\n  latency_ms: 0"
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.auditor.id, "auditor-7");
    assert_eq!(config.knowledge.accepted_types, vec![".pdf", ".docx"]);
    assert_eq!(config.mock.latency_ms, 0);
    assert_eq!(config.mock.regenerate_latency_ms, 500);
    assert!(config.api.use_mock);
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "mock:\n  failure_rate: 2.0").unwrap();

    assert!(AppConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    assert!(AppConfig::load(Some(&missing)).is_err());
}
