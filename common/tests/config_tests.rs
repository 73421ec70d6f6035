// Tests for layered configuration loading

use common::config::Settings;
use std::fs;
use tempfile::TempDir;

#[test]
fn missing_files_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load_from_path(dir.path()).unwrap();
    assert_eq!(settings.cloud.command, "/v1/Metrics.Publish");
    assert_eq!(settings.scheduler.interval_ms, 2000);
    assert!(settings.validate().is_ok());
}

#[test]
fn default_file_overrides_builtin_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("default.toml"),
        r#"
[cloud]
endpoint_url = "http://127.0.0.1:8080/rpc"

[sensor]
min_value = 10.0
span = 5.0

[scheduler]
interval_ms = 500
response_timeout_ms = 250
"#,
    )
    .unwrap();

    let settings = Settings::load_from_path(dir.path()).unwrap();
    assert_eq!(settings.cloud.endpoint_url, "http://127.0.0.1:8080/rpc");
    // Fields absent from the file keep their defaults
    assert_eq!(settings.cloud.metric_name, "value");
    assert_eq!(settings.sensor.min_value, 10.0);
    assert_eq!(settings.sensor.span, 5.0);
    assert_eq!(settings.scheduler.interval_ms, 500);
    assert_eq!(settings.scheduler.response_timeout_ms, Some(250));
    assert!(settings.validate().is_ok());
}

#[test]
fn local_file_overrides_default_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("default.toml"),
        "[transport]\ncheck_interval_ms = 1500\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("local.toml"),
        "[transport]\ncheck_interval_ms = 250\n",
    )
    .unwrap();

    let settings = Settings::load_from_path(dir.path()).unwrap();
    assert_eq!(settings.transport.check_interval_ms, 250);
}

#[test]
fn environment_overrides_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("default.toml"), "[device]\nname = \"From File\"\n").unwrap();

    std::env::set_var("APP__DEVICE__NAME", "From Env");
    let settings = Settings::load_from_path(dir.path());
    std::env::remove_var("APP__DEVICE__NAME");

    assert_eq!(settings.unwrap().device.name, "From Env");
}

#[test]
fn invalid_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("default.toml"), "[scheduler]\ninterval_ms = 0\n").unwrap();

    let settings = Settings::load_from_path(dir.path()).unwrap();
    assert!(settings.validate().is_err());
}
