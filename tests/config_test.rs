//! Integration tests for Settings loading.
//!
//! Layers, lowest to highest: defaults, global file, local file, BOGRAPH_* env vars.
//! These tests use temp directories only, so the local file merges onto defaults.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use bograph::application::ApplicationError;
use bograph::config::Settings;

#[test]
fn given_partial_local_config_when_load_then_merges_with_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bograph.toml");
    fs::write(
        &path,
        r#"
[server]
port = 8088

[upload]
field = "workbook"
keep_files = true
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.server.port, 8088);
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.upload.field, "workbook");
    assert!(settings.upload.keep_files);
    assert_eq!(settings.upload.max_bytes, 10 * 1024 * 1024);
}

#[test]
fn given_missing_explicit_config_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");

    let result = Settings::load(Some(&path));

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("not found")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn given_invalid_toml_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bograph.toml");
    fs::write(&path, "[server\nport = ").unwrap();

    let result = Settings::load(Some(&path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_empty_upload_field_when_load_then_validation_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bograph.toml");
    fs::write(&path, "[upload]\nfield = \"  \"\n").unwrap();

    let result = Settings::load(Some(&path));

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("upload.field")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn given_tilde_in_upload_dir_when_load_then_path_is_expanded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bograph.toml");
    fs::write(&path, "[upload]\ndir = \"~/bograph-uploads\"\n").unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");

    assert!(!settings.upload.dir.starts_with("~"));
    assert!(settings.upload.dir.ends_with("bograph-uploads"));
}

#[test]
fn given_effective_settings_when_rendered_then_toml_round_trips_values() {
    let mut settings = Settings::default();
    settings.server.port = 9000;
    settings.upload.dir = PathBuf::from("/srv/uploads");

    let rendered = settings.to_toml().unwrap();

    assert!(rendered.contains("port = 9000"));
    assert!(rendered.contains("/srv/uploads"));
}

#[test]
fn given_template_when_parsed_then_it_is_valid_toml() {
    let template = Settings::template();

    let parsed: Result<toml::Value, _> = toml::from_str(&template);

    assert!(parsed.is_ok());
    assert!(template.contains("BOGRAPH_SERVER__PORT"));
}
