use openduck::config::{AppConfig, ConfigManager};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    assert_eq!(config.query.preview_limit, 100);
    assert_eq!(config.query.history_limit, 1000);
    assert!(config.query.enable_history);
    assert!(config.query.run_on_open);

    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.performance.max_concurrent_queries, 4);

    assert_eq!(config.display.max_column_width, 40);
    assert!(!config.display.row_numbers);

    assert_eq!(config.theme.color_mode, "auto");
    assert_eq!(config.theme.colors.primary, "cyan");
    assert_eq!(config.theme.colors.controls_bg, "indexed(236)");

    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_level, "info");

    assert!(config.validate().is_ok());
}

#[test]
fn test_default_template_parses_to_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();
    for section in [
        "[query]",
        "[performance]",
        "[display]",
        "[theme]",
        "[theme.colors]",
        "[debug]",
    ] {
        assert!(template.contains(section), "missing {section}");
    }

    let parsed: AppConfig = toml::from_str(&template).unwrap();
    let defaults = AppConfig::default();
    assert_eq!(parsed.query.preview_limit, defaults.query.preview_limit);
    assert_eq!(parsed.theme.colors.directory, defaults.theme.colors.directory);
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_missing_file_loads_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.query.preview_limit, 100);
}

#[test]
fn test_partial_config_merges_over_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r#"
[query]
preview_limit = 25
run_on_open = false

[theme.colors]
primary = "magenta"
"#,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.query.preview_limit, 25);
    assert!(!config.query.run_on_open);
    assert_eq!(config.query.history_limit, 1000);
    assert_eq!(config.theme.colors.primary, "magenta");
    assert_eq!(config.theme.colors.error, "red");

    let options = config.registry_options();
    assert_eq!(options.preview_limit, 25);
    assert!(!options.run_on_open);
    assert!(options.record_history);
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    write_config(&config_manager, "[performance]\nmax_concurrent_queries = 0\n");
    assert!(AppConfig::load_from(&config_manager).is_err());

    write_config(&config_manager, "[debug]\nlog_level = \"loud\"\n");
    let err = AppConfig::load_from(&config_manager).unwrap_err().to_string();
    assert!(err.contains("log_level"));

    write_config(&config_manager, "version = \"2.0\"\n");
    assert!(AppConfig::load_from(&config_manager).is_err());

    std::env::remove_var("NO_COLOR");
    write_config(&config_manager, "[theme.colors]\nprimary = \"ultraviolet\"\n");
    assert!(AppConfig::load_from(&config_manager).is_err());
}

#[test]
fn test_unparseable_file_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "[query\npreview_limit = ");
    let err = AppConfig::load_from(&config_manager).unwrap_err().to_string();
    assert!(err.contains("Failed to parse config file"));
}

#[test]
fn test_write_default_config_respects_force() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.write_default_config(false).unwrap();
    assert!(path.exists());
    assert!(config_manager.write_default_config(false).is_err());

    fs::write(&path, "# edited").unwrap();
    config_manager.write_default_config(true).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[query]"));
}
