//! Loading a relay config file from disk.

use custody_relay::config::{load_config, ConfigError, RelayConfig};

mod common;

fn load(contents: &str) -> Result<RelayConfig, ConfigError> {
    let path = common::temp_path("relay.toml");
    std::fs::write(&path, contents).unwrap();
    let result = load_config(&path);
    let _ = std::fs::remove_file(&path);
    result
}

#[test]
fn test_full_file_loads() {
    let result = load(
        r#"
[signer]
base_url = "https://custody.example"
poll_interval_ms = 250

[indexer]
base_url = "https://indexer.example/api/v0"
page_size = 50

[claims]
base_url = "https://claims.example/api"
terms_hash = "9f86d081"
batch_size = 10

[pool]
max_size = 20
idle_timeout_secs = 600

[transfer]
fee = 180000

[observability]
log_level = "debug"
json_logs = true
"#,
    );

    let config = result.unwrap();
    assert_eq!(config.signer.poll_interval().as_millis(), 250);
    assert_eq!(config.indexer.page_size, 50);
    assert_eq!(config.claims.batch_size, 10);
    assert_eq!(config.claims.clear_threshold_percent, 80);
    assert_eq!(config.pool.max_size, 20);
    assert_eq!(config.transfer.fee, 180_000);
    assert_eq!(config.transfer.recipient_min, 1_200_000);
    assert!(config.observability.json_logs);
}

#[test]
fn test_invalid_values_reported_together() {
    let result = load(
        r#"
[signer]
base_url = "not a url"

[pool]
max_size = 0
"#,
    );

    match result.unwrap_err() {
        ConfigError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field == "signer.base_url"));
            assert!(errors.iter().any(|e| e.field == "pool.max_size"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_file() {
    let err = load_config(std::path::Path::new("/nonexistent/relay.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
