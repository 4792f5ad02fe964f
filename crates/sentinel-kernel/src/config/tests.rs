//! File-backed tests for the configuration loader.

use super::*;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct GatewayFile {
    #[serde(default)]
    port: Option<u16>,
    default_limit: u32,
    #[serde(default)]
    api_keys: Vec<String>,
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> Environment {
    let map: config::Map<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::with_prefix("SENTINEL")
        .prefix_separator("_")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("api_keys")
        .source(Some(map))
}

#[test]
fn loads_every_format_from_disk() {
    let dir = TempDir::new().unwrap();
    let files = [
        ("a.toml", "default_limit = 7\n"),
        ("a.yaml", "default_limit: 7\n"),
        ("a.json", r#"{ "default_limit": 7 }"#),
        ("a.ron", "(default_limit: 7)"),
    ];

    for (name, content) in files {
        let path = write(&dir, name, content);
        let cfg: GatewayFile = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.default_limit, 7, "format {name}");
    }
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config::<GatewayFile>(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn file_content_substitutes_env_vars() {
    // PATH is always set; its value is not a number, so substitute into a list.
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "subst.yaml",
        "default_limit: 3\napi_keys:\n  - \"${PATH}\"\n",
    );
    let cfg: GatewayFile = load_config(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.api_keys, vec![std::env::var("PATH").unwrap()]);
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "base.toml", "default_limit = 100\nport = 8000\n");

    let cfg: GatewayFile = load_layered(
        Some(path.to_str().unwrap()),
        env(&[("SENTINEL_DEFAULT_LIMIT", "25")]),
    )
    .unwrap();

    assert_eq!(cfg.default_limit, 25);
    assert_eq!(cfg.port, Some(8000));
}

#[test]
fn environment_alone_is_enough() {
    let cfg: GatewayFile = load_layered(
        None,
        env(&[
            ("SENTINEL_DEFAULT_LIMIT", "10"),
            ("SENTINEL_API_KEYS", "alpha,beta"),
        ]),
    )
    .unwrap();

    assert_eq!(cfg.default_limit, 10);
    assert_eq!(cfg.api_keys, vec!["alpha".to_string(), "beta".to_string()]);
}
