//! Layered configuration from defaults, files and the environment.

use prefer::error::ConfigError;
use prefer::layered::Tree;
use prefer::{ConfigBuilder, ConfigMap, LoadContext};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

fn tree(value: Value) -> Tree {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a mapping"),
    }
}

fn context(dir: &TempDir) -> LoadContext {
    LoadContext::default().with_search_paths([dir.path().to_path_buf()])
}

#[test]
fn test_env_source_nests_keys() {
    // Unique prefix: the process environment is shared across tests.
    unsafe {
        std::env::set_var("PREFER_NEST__DB__HOST", "localhost");
        std::env::set_var("PREFER_NEST__DB__PORT", "5432");
        std::env::set_var("PREFER_NESTED_OTHER", "ignored");
    }

    let config = ConfigBuilder::new().add_env("PREFER_NEST").build().unwrap();

    assert_eq!(
        config.get(""),
        Some(&json!({"db": {"host": "localhost", "port": "5432"}}))
    );
}

#[test]
fn test_file_overrides_defaults_and_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.toml"),
        "[server]\nhost = \"file\"\nport = 9000\n",
    )
    .unwrap();
    unsafe {
        std::env::set_var("PREFER_LAYER__SERVER__HOST", "env");
    }

    let config = ConfigBuilder::with_context(context(&dir))
        .add_defaults(tree(json!({
            "server": {"host": "default", "port": 80, "workers": 4}
        })))
        .add_file("app")
        .add_env("PREFER_LAYER")
        .build()
        .unwrap();

    assert_eq!(config.get_str("server.host"), Some("env"));
    assert_eq!(config.get_int("server.port"), Some(9000));
    assert_eq!(config.get_int("server.workers"), Some(4));
}

#[test]
fn test_missing_required_file_fails() {
    let dir = TempDir::new().unwrap();
    let result = ConfigBuilder::with_context(context(&dir))
        .add_file("missing")
        .build();
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_missing_optional_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::with_context(context(&dir))
        .add_defaults(tree(json!({"a": 1})))
        .add_optional_file("missing")
        .build()
        .unwrap();
    assert_eq!(config.get_int("a"), Some(1));
}

#[test]
fn test_optional_file_that_fails_to_decode_is_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.json"), "{").unwrap();

    let config = ConfigBuilder::with_context(context(&dir))
        .add_optional_file("broken")
        .build()
        .unwrap();
    assert!(config.keys().is_empty());
}

#[test]
fn test_file_that_is_not_a_mapping() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("list.yaml"), "- a\n- b\n").unwrap();

    let result = ConfigBuilder::with_context(context(&dir))
        .add_file("list")
        .build();
    assert!(matches!(result, Err(ConfigError::NotAMapping { .. })));
}

#[test]
fn test_extract_section_from_loaded_map() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        host: String,
        port: u16,
    }

    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.yaml"),
        "database:\n  host: db.local\n  port: 5432\n",
    )
    .unwrap();

    let config = ConfigMap::load_with_context("app", context(&dir)).unwrap();
    let database: Database = config.extract("database").unwrap();
    assert_eq!(
        database,
        Database {
            host: "db.local".to_string(),
            port: 5432
        }
    );
}
