//! Integration tests for Settings config loading with layered precedence.
//!
//! These tests pass an explicit global config file from a temp directory and
//! an explicit environment, so neither the user's real
//! `~/.config/qtree/qtree.toml` nor their `QTREE_*` variables are read.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use qtree::application::{ApplicationError, ApplicationResult};
use qtree::config::{env_source, Settings};

fn load(path: Option<&Path>, vars: &[(&str, &str)]) -> ApplicationResult<Settings> {
    let vars: config::Map<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::load_with(path, env_source().source(Some(vars)))
}

#[test]
fn given_no_global_file_when_loading_then_uses_defaults() {
    let temp = TempDir::new().unwrap();

    let settings = load(Some(&temp.path().join("missing.toml")), &[]).unwrap();

    assert_eq!(settings.storage_key, "treeNodes");
    assert_eq!(settings.layout.level_spacing, 150.0);
    assert_eq!(settings.layout.sibling_spacing, 200.0);
    assert_eq!(settings.layout.origin_x, 500.0);
    assert_eq!(settings.max_children, 1000);
}

#[test]
fn given_global_file_when_loading_then_overrides_specified_fields_only() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("qtree.toml");
    fs::write(
        &path,
        r#"
storage_key = "questions"

[layout]
sibling_spacing = 120.0
"#,
    )
    .unwrap();

    // Act
    let settings = load(Some(&path), &[]).unwrap();

    // Assert
    assert_eq!(settings.storage_key, "questions");
    assert_eq!(settings.layout.sibling_spacing, 120.0);
    assert_eq!(
        settings.layout.level_spacing, 150.0,
        "unspecified layout values keep defaults"
    );
}

#[test]
fn given_data_dir_with_tilde_when_loading_then_expands_home() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("qtree.toml");
    fs::write(&path, "data_dir = \"~/trees\"\n").unwrap();

    let settings = load(Some(&path), &[]).unwrap();

    let home = std::env::var("HOME").expect("HOME should be set");
    assert!(settings.data_dir.starts_with(&home));
    assert!(settings.data_dir.ends_with("trees"));
}

#[test]
fn given_malformed_global_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("qtree.toml");
    fs::write(&path, "storage_key = [unclosed").unwrap();

    let result = load(Some(&path), &[]);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_empty_storage_key_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("qtree.toml");
    fs::write(&path, "storage_key = \"\"\n").unwrap();

    let result = load(Some(&path), &[]);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_qtree_env_vars_when_loading_then_override_global_file() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("qtree.toml");
    fs::write(
        &path,
        r#"
storage_key = "from-file"
max_children = 50

[layout]
sibling_spacing = 120.0
origin_x = 10.0
"#,
    )
    .unwrap();

    // Act
    let settings = load(
        Some(&path),
        &[
            ("QTREE_STORAGE_KEY", "from-env"),
            ("QTREE_LAYOUT__SIBLING_SPACING", "123.0"),
        ],
    )
    .unwrap();

    // Assert
    assert_eq!(settings.storage_key, "from-env");
    assert_eq!(settings.layout.sibling_spacing, 123.0);
    assert_eq!(settings.layout.origin_x, 10.0, "file value without env override");
    assert_eq!(settings.max_children, 50);
}

#[test]
fn given_negative_max_children_in_env_when_loading_then_config_error() {
    let result = load(None, &[("QTREE_MAX_CHILDREN", "-1")]);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}
