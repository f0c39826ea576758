//! Configuration tests
//!
//! The round-trip test guards the TOML template: when a field is added to
//! Config, it fails until the template and FileConfig agree again.

use super::*;

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );
}

#[test]
fn test_file_values_round_trip_exactly() {
    let file: FileConfig = toml::from_str(&Config::default().to_toml()).unwrap();
    let config = Config::from_file_config(file);
    let defaults = Config::default();

    assert_eq!(config.data_dir, defaults.data_dir);
    assert_eq!(config.events_file, defaults.events_file);
    assert_eq!(config.artifacts_dir, defaults.artifacts_dir);
    assert_eq!(config.session_gap_minutes, defaults.session_gap_minutes);
    assert_eq!(config.bind_addr, defaults.bind_addr);
    assert_eq!(config.logging.level, defaults.logging.level);
    assert_eq!(config.logging.file_rotation, defaults.logging.file_rotation);
}

#[test]
fn test_file_config_overrides_defaults() {
    let file: FileConfig = toml::from_str(
        r#"
        session_gap_minutes = 45
        artifacts_dir = "/tmp/cartflow-artifacts"

        [logging]
        level = "debug"
        file_rotation = "hourly"
        "#,
    )
    .unwrap();
    let config = Config::from_file_config(file);

    assert_eq!(config.session_gap_minutes, 45);
    assert_eq!(
        config.artifacts_dir,
        std::path::PathBuf::from("/tmp/cartflow-artifacts")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file_rotation, LogRotation::Hourly);
    // Untouched fields keep defaults
    assert_eq!(config.events_file, "events.csv");
    assert_eq!(config.bind_addr, Config::default().bind_addr);
}

#[test]
fn test_rotation_parsing_is_forgiving() {
    assert_eq!(LogRotation::from_str("HOURLY"), LogRotation::Hourly);
    assert_eq!(LogRotation::from_str("never"), LogRotation::Never);
    assert_eq!(LogRotation::from_str("weekly"), LogRotation::Daily);
}

#[test]
fn test_session_gap_duration() {
    let config = Config {
        session_gap_minutes: 45,
        ..Config::default()
    };
    assert_eq!(config.session_gap(), chrono::Duration::minutes(45));
}

#[test]
fn test_events_path_joins_dir_and_file() {
    let config = Config::default();
    assert_eq!(
        config.events_path(),
        std::path::Path::new("./data/raw").join("events.csv")
    );
}
