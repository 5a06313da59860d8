use std::fs;
use std::path::PathBuf;

use gpiofs::{ConfigError, GpioConfig, SettleConfig};

#[test]
fn defaults_point_at_sysfs() {
    let config = GpioConfig::default();

    assert_eq!(config.base_path, PathBuf::from("/sys/class/gpio"));
    assert_eq!(config.export_path(), PathBuf::from("/sys/class/gpio/export"));
    assert_eq!(
        config.unexport_path(),
        PathBuf::from("/sys/class/gpio/unexport")
    );
    assert_eq!(config.pin_path(18), PathBuf::from("/sys/class/gpio/gpio18"));
    assert_eq!(config.settle, SettleConfig::default());
}

#[test]
fn partial_json_keeps_defaults() {
    let config = GpioConfig::from_json(r#"{ "base_path": "/tmp/gpio" }"#).unwrap();

    assert_eq!(config.base_path, PathBuf::from("/tmp/gpio"));
    assert_eq!(config.settle.attempts, 5);
    assert_eq!(config.settle.delay_ms, 20);

    let config = GpioConfig::from_json(r#"{ "settle": { "delay_ms": 100 } }"#).unwrap();
    assert_eq!(config.settle.attempts, 5);
    assert_eq!(config.settle.delay_ms, 100);
}

#[test]
fn rejects_invalid_config() {
    assert!(matches!(
        GpioConfig::from_json(r#"{ "settle": { "attempts": 0 } }"#),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        GpioConfig::from_json(r#"{ "base_path": "" }"#),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        GpioConfig::from_json("not json"),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn load_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("gpio.json");
    fs::write(
        &path,
        r#"{ "base_path": "/srv/gpio", "settle": { "attempts": 2, "delay_ms": 5 } }"#,
    )
    .unwrap();

    let config = GpioConfig::load_from_file(&path).unwrap();
    assert_eq!(config.base_path, PathBuf::from("/srv/gpio"));
    assert_eq!(
        config.settle,
        SettleConfig {
            attempts: 2,
            delay_ms: 5
        }
    );

    let missing = GpioConfig::load_from_file(temp.path().join("missing.json"));
    assert!(matches!(missing, Err(ConfigError::Read(_))));
}
