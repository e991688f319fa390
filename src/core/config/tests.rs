use super::data::Config;
use super::io::ConfigError;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    assert!(config.set_value("endpoint", Some("http://wiki/bin/configure".to_string())));
    assert!(config.set_value("path-info", Some("Security".to_string())));
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.endpoint.as_deref(), Some("http://wiki/bin/configure"));
    assert_eq!(loaded.path_info.as_deref(), Some("Security"));

    let mut loaded = loaded;
    assert!(loaded.set_value("path-info", None));
    loaded.save_to_path(&config_path).expect("Failed to save config");

    let reloaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(reloaded.path_info, None);
    assert_eq!(reloaded.endpoint.as_deref(), Some("http://wiki/bin/configure"));
}

#[test]
fn test_unknown_key_is_rejected() {
    let mut config = Config::default();
    assert!(!config.set_value("theme", Some("dark".to_string())));
    assert_eq!(config, Config::default());
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "endpoint = [unclosed").expect("write config");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_exchange_settings_ignore_empty_values() {
    let config = Config {
        endpoint: Some(String::new()),
        path_info: Some("Mail".to_string()),
        ..Default::default()
    };
    let settings = config.exchange_settings();
    assert_eq!(settings.endpoint, None);
    assert_eq!(settings.path_info.as_deref(), Some("Mail"));
}

#[test]
fn test_default_user_agent_names_crate() {
    let config = Config::default();
    assert!(config
        .user_agent_or_default()
        .starts_with("configure-feedback/"));
}
