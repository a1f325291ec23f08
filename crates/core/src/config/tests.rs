use std::collections::HashMap;
use std::time::Duration;

use super::types::{redact_password, UpdaterConfig};
use super::validation::is_valid_collection_name;

#[test]
fn empty_toml_uses_memory_defaults() {
    let cfg = UpdaterConfig::from_toml("").unwrap();
    assert_eq!(cfg.messaging.backend, "memory");
    assert_eq!(cfg.messaging.queue, "status");
    assert_eq!(cfg.persistence.backend, "memory");
    assert_eq!(cfg.persistence.collection, "status");
    assert_eq!(cfg.ingestor.heartbeat_interval(), Duration::from_secs(15));
    assert_eq!(cfg.retention.days, 14);
    assert_eq!(cfg.retention.sweep_interval(), Some(Duration::from_secs(3600)));
}

#[test]
fn parse_full_toml() {
    let toml = r#"
[messaging]
backend = "zmq"
endpoint = "tcp://10.0.0.1:5556"
queue = "status"

[persistence]
backend = "postgres"
url = "postgres://status:secret@db:5432/metahosting"
collection = "status_points"
max_connections = 8

[ingestor]
heartbeat_interval_secs = 5
shutdown_timeout_secs = 3

[retention]
days = 30
sweep_interval_secs = 0
"#;
    let cfg = UpdaterConfig::from_toml(toml).unwrap();
    assert_eq!(cfg.messaging.backend, "zmq");
    assert_eq!(cfg.messaging.endpoint.as_deref(), Some("tcp://10.0.0.1:5556"));
    assert_eq!(cfg.persistence.collection, "status_points");
    assert_eq!(cfg.persistence.max_connections, 8);
    assert_eq!(cfg.ingestor.heartbeat_interval(), Duration::from_secs(5));
    assert_eq!(cfg.ingestor.shutdown_timeout(), Duration::from_secs(3));
    assert_eq!(cfg.retention.days, 30);
    assert_eq!(cfg.retention.sweep_interval(), None);
}

#[test]
fn unknown_messaging_backend_rejected() {
    let toml = r#"
[messaging]
backend = "amqp"
"#;
    let err = UpdaterConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("amqp"), "got: {err}");
}

#[test]
fn unknown_persistence_backend_rejected() {
    let toml = r#"
[persistence]
backend = "mongodb"
"#;
    let err = UpdaterConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("mongodb"), "got: {err}");
}

#[test]
fn zmq_without_endpoint_rejected() {
    let toml = r#"
[messaging]
backend = "zmq"
"#;
    let err = UpdaterConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("endpoint"), "got: {err}");
}

#[test]
fn postgres_without_url_rejected() {
    let toml = r#"
[persistence]
backend = "postgres"
"#;
    let err = UpdaterConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("url"), "got: {err}");
}

#[test]
fn zero_heartbeat_rejected() {
    let toml = r#"
[ingestor]
heartbeat_interval_secs = 0
"#;
    assert!(UpdaterConfig::from_toml(toml).is_err());
}

#[test]
fn zero_retention_days_rejected() {
    let toml = r#"
[retention]
days = 0
"#;
    assert!(UpdaterConfig::from_toml(toml).is_err());
}

#[test]
fn bad_collection_name_rejected() {
    let toml = r#"
[persistence]
collection = "status; drop table x"
"#;
    let err = UpdaterConfig::from_toml(toml).unwrap_err();
    assert!(err.to_string().contains("collection"), "got: {err}");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = UpdaterConfig::from_toml("[messaging\nbackend = ").unwrap_err();
    assert!(err.to_string().starts_with("config parse error"), "got: {err}");
}

#[test]
fn overrides_replace_file_values() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STATUS_MESSAGING_BACKEND", "zmq"),
        ("STATUS_MESSAGING_ENDPOINT", "tcp://override:7000"),
        ("STATUS_PERSISTENCE_COLLECTION", "other"),
        ("STATUS_HEARTBEAT_INTERVAL", "2"),
        ("STATUS_RETENTION_DAYS", "7"),
        ("STATUS_RETENTION_SWEEP_INTERVAL", "60"),
    ]);

    let mut cfg: UpdaterConfig = toml::from_str("[messaging]\nqueue = \"status\"\n").unwrap();
    cfg.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
    cfg.validate().unwrap();

    assert_eq!(cfg.messaging.backend, "zmq");
    assert_eq!(cfg.messaging.endpoint.as_deref(), Some("tcp://override:7000"));
    assert_eq!(cfg.persistence.collection, "other");
    assert_eq!(cfg.ingestor.heartbeat_interval_secs, 2);
    assert_eq!(cfg.retention.days, 7);
    assert_eq!(cfg.retention.sweep_interval_secs, 60);
}

#[test]
fn unparseable_numeric_override_is_ignored() {
    let mut cfg = UpdaterConfig::default();
    cfg.apply_overrides(|key| (key == "STATUS_RETENTION_DAYS").then(|| "two weeks".to_string()));
    assert_eq!(cfg.retention.days, 14);
}

#[test]
fn collection_names() {
    assert!(is_valid_collection_name("status"));
    assert!(is_valid_collection_name("_status_2"));
    assert!(!is_valid_collection_name(""));
    assert!(!is_valid_collection_name("2status"));
    assert!(!is_valid_collection_name("status-points"));
    assert!(!is_valid_collection_name(&"x".repeat(64)));
}

#[test]
fn password_is_redacted() {
    assert_eq!(
        redact_password("postgres://status:secret@db:5432/metahosting"),
        "postgres://status:***@db:5432/metahosting"
    );
    assert_eq!(redact_password("postgres://db/metahosting"), "postgres://db/metahosting");
    assert_eq!(redact_password("postgres://status@db/x"), "postgres://status@db/x");
}
