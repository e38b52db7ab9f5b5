//! Integration tests for configuration loading and graceful degradation
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests
//! that manipulate ZEMER_* variables are marked with #[serial] so they run
//! sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::io::Write;
use zemer_common::config::Config;

fn clear_env() {
    env::remove_var("ZEMER_CONFIG");
    env::remove_var("ZEMER_PORT");
    env::remove_var("ZEMER_AUTH_USERNAME");
    env::remove_var("ZEMER_AUTH_PASSWORD");
}

#[test]
#[serial]
fn missing_default_config_degrades_to_defaults() {
    clear_env();
    let config = Config::load(None).expect("defaults should always load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.auth.username, "zemereshet");
}

#[test]
#[serial]
fn explicit_missing_config_path_is_an_error() {
    clear_env();
    let missing = std::path::Path::new("/nonexistent/zemer/config.toml");
    assert!(Config::load(Some(missing)).is_err());
}

#[test]
#[serial]
fn config_file_values_are_applied() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [server]
        port = 9999

        [auth]
        username = "admin"
        password = "hunter2"
        "#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.server.port, 9999);
    assert_eq!(config.auth.username, "admin");
    assert_eq!(config.auth.password, "hunter2");
    // Sections absent from the file keep their defaults
    assert_eq!(config.fetch.page_timeout_secs, 30);
}

#[test]
#[serial]
fn malformed_config_file_is_an_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is not toml = [").unwrap();
    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
#[serial]
fn env_overrides_beat_file_values() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [server]
        port = 9999
        "#
    )
    .unwrap();

    env::set_var("ZEMER_PORT", "4242");
    env::set_var("ZEMER_AUTH_PASSWORD", "from-env");
    let config = Config::load(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.server.port, 4242);
    assert_eq!(config.auth.password, "from-env");
}

#[test]
#[serial]
fn non_numeric_port_override_is_ignored() {
    clear_env();
    env::set_var("ZEMER_PORT", "not-a-port");
    let config = Config::load(None).unwrap();
    clear_env();
    assert_eq!(config.server.port, 3000);
}
