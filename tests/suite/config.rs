//! Configuration to console wiring

use std::io::Write;

use towerlink_config::{ConsoleConfig, ENV_READ_ONLY, ENV_TELEMETRY_URL};
use towerlink_engine::SafetyGate;

#[test]
fn missing_file_yields_read_only_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConsoleConfig::load_with(Some(&dir.path().join("config.toml")), |_| None).unwrap();
    assert!(config.read_only);
    assert_eq!(SafetyGate::from_read_only(config.read_only), SafetyGate::ReadOnly);
    assert_eq!(config.telemetry_url.as_str(), "ws://localhost/ws");
}

#[test]
fn environment_overrides_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[endpoints]
telemetry = "ws://bridge.plant:8080/ws"
api = "http://bridge.plant:8000"

[session]
read_only = true
poll_interval_ms = 2000
"#
    )
    .unwrap();

    let config = ConsoleConfig::load_with(Some(file.path()), |key| match key {
        k if k == ENV_READ_ONLY => Some("false".to_string()),
        k if k == ENV_TELEMETRY_URL => Some("wss://bridge.plant/ws".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(SafetyGate::from_read_only(config.read_only), SafetyGate::Armed);
    assert_eq!(config.telemetry_url.scheme(), "wss");
    assert_eq!(config.api_url.host_str(), Some("bridge.plant"));
    assert_eq!(config.poll_interval, Some(std::time::Duration::from_millis(2000)));
}
