//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading client configuration from files.

use std::io::Write;

use smsdesk_domain::SmsDeskError;
use smsdesk_infra::config;
use smsdesk_infra::ApiClientConfig;
use tempfile::Builder;

fn write_config(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "api": {
            "base_url": "https://api.staging.smsdesk.app/v1",
            "request_timeout_ms": 5000,
            "user_agent": "smsdesk-dashboard/2.1"
        },
        "retry": {
            "max_retries": 5,
            "base_delay_ms": 200,
            "max_delay_ms": 4000,
            "jitter": true
        },
        "shop": {
            "shop": "foo.myshopify.com"
        },
        "logging": {
            "level": "debug",
            "json": true
        }
    }"#;
    let file = write_config(json_content, ".json");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.api.base_url, "https://api.staging.smsdesk.app/v1");
    assert_eq!(config.api.request_timeout_ms, 5000);
    assert_eq!(config.api.user_agent.as_deref(), Some("smsdesk-dashboard/2.1"));
    assert_eq!(config.retry.max_retries, 5);
    assert!(config.retry.jitter);
    assert_eq!(config.shop.shop.as_deref(), Some("foo.myshopify.com"));
    assert_eq!(config.shop.domain_suffix, ".myshopify.com");
    assert!(config.logging.json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[api]
base_url = "http://localhost:8787"

[retry]
max_retries = 1
base_delay_ms = 50
max_delay_ms = 100

[shop]
domain_suffix = ".shops.test"
"#;
    let file = write_config(toml_content, ".toml");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.api.base_url, "http://localhost:8787");
    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.shop.domain_suffix, ".shops.test");

    let client_config = ApiClientConfig::from(&config);
    assert_eq!(client_config.retry.max_attempts(), 2);
    assert_eq!(client_config.shop_domain_suffix, ".shops.test");
}

#[test]
fn test_load_config_with_minimal_fields() {
    let file = write_config("{}", ".json");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config with minimal fields");

    assert_eq!(config, smsdesk_domain::ClientConfig::default());
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.api.request_timeout_ms, 30_000);
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/config.json".into()));

    match result {
        Err(SmsDeskError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let file = write_config(r#"{ "this is": "not valid" "#, ".json");

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(SmsDeskError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

/// An invalid environment value is reported even when a config file exists
///
/// The only test in this binary that touches the environment.
#[test]
fn test_load_rejects_invalid_env_value() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("smsdesk.json"),
        r#"{"api": {"base_url": "https://file.example.com"}}"#,
    )
    .expect("write config");
    let previous = std::env::current_dir().expect("cwd");
    std::env::set_current_dir(dir.path()).expect("enter temp dir");
    std::env::set_var("SMSDESK_API_BASE_URL", "https://env.example.com");
    std::env::set_var("SMSDESK_MAX_RETRIES", "abc");

    let result = config::load();

    std::env::remove_var("SMSDESK_API_BASE_URL");
    std::env::remove_var("SMSDESK_MAX_RETRIES");
    std::env::set_current_dir(previous).expect("restore cwd");

    match result {
        Err(SmsDeskError::Config(msg)) => assert!(msg.contains("SMSDESK_MAX_RETRIES")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}
