//! Unit tests for config module
//!
//! Tests configuration types, defaults, and serialization.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::io::Write;

use crate::config::Config;

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, "info");
    assert!(config.media.ignored_players.is_empty());
    assert!(config.media.resolve_local_art);
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[media]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [media]
        ignored_players = ["playerctld"]
        resolve_local_art = false
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.media.ignored_players, vec!["playerctld"]);
    assert!(!config.media.resolve_local_art);
}

#[test]
fn config_empty_toml() {
    let config: Config = toml::from_str("").unwrap();

    assert_eq!(config.general.log_level, "info");
    assert!(config.media.resolve_local_art);
}

#[test]
fn config_partial_section() {
    let toml_str = r#"
        [media]
        ignored_players = ["kdeconnect"]
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.media.ignored_players, vec!["kdeconnect"]);
    assert!(config.media.resolve_local_art);
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn config_load_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.general.log_level, "info");
}

#[test]
fn config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[general]\nlog_level = \"trace\"").unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.general.log_level, "trace");
}

#[test]
fn config_load_invalid_toml_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "general = not valid").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}
