//! Unit tests for configuration resolution
//!
//! Tests that manipulate FOODLENS_SERVER_URL / FOODLENS_CONFIG are marked
//! with #[serial] so they never run in parallel.

use foodlens_common::config::{
    load_toml_config, resolve_config_path, resolve_server_url, set_server_url,
    write_toml_config, TomlConfig, CONFIG_PATH_ENV, DEFAULT_SERVER_URL, SERVER_URL_ENV,
};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_overrides_persisted_setting() {
    std::env::set_var(SERVER_URL_ENV, "https://env.example/");

    let config = TomlConfig {
        server_url: Some("https://persisted.example".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve_server_url(&config), "https://env.example");

    std::env::remove_var(SERVER_URL_ENV);
}

#[test]
#[serial]
fn test_persisted_setting_used_without_env() {
    std::env::remove_var(SERVER_URL_ENV);

    let config = TomlConfig {
        server_url: Some("https://persisted.example".to_string()),
        ..Default::default()
    };

    assert_eq!(resolve_server_url(&config), "https://persisted.example");
}

#[test]
#[serial]
fn test_default_when_nothing_configured() {
    std::env::set_var(SERVER_URL_ENV, "   ");

    let config = TomlConfig {
        server_url: Some(String::new()),
        ..Default::default()
    };

    assert_eq!(resolve_server_url(&config), DEFAULT_SERVER_URL);

    std::env::remove_var(SERVER_URL_ENV);
}

#[test]
fn test_missing_file_is_default_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "server_url = [not toml").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("Parse TOML failed"));
}

#[test]
fn test_write_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.locale = Some("ko-KR".to_string());
    config.lookup.max_attempts = 5;

    write_toml_config(&config, &path).unwrap();

    assert_eq!(load_toml_config(&path).unwrap(), config);
    assert!(!path.with_extension("toml.tmp").exists());
}

#[test]
fn test_set_server_url_strips_slash_and_clears() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    set_server_url(&path, "https://custom.example/").unwrap();
    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.server_url.as_deref(), Some("https://custom.example"));

    set_server_url(&path, "").unwrap();
    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.server_url, None);
}

#[test]
fn test_set_server_url_rejects_non_http() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    assert!(set_server_url(&path, "ftp://nope.example").is_err());
    assert!(!path.exists());
}

#[test]
#[serial]
fn test_config_path_priority() {
    let explicit = std::path::Path::new("/tmp/explicit.toml");
    std::env::set_var(CONFIG_PATH_ENV, "/tmp/from-env.toml");

    assert_eq!(resolve_config_path(Some(explicit)).unwrap(), explicit);
    assert_eq!(
        resolve_config_path(None).unwrap(),
        std::path::PathBuf::from("/tmp/from-env.toml")
    );

    std::env::remove_var(CONFIG_PATH_ENV);
}
