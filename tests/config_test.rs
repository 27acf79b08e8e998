use std::io::Write;

use tokenmeter::{Config, TokenmeterError, version_string};

#[test]
fn empty_config_uses_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.service.name, "tokenmeter");
    assert_eq!(config.service.version, version_string());
    assert_eq!(config.histograms.latency_ms.first(), Some(&5.0));
    assert_eq!(config.histograms.size_bytes.len(), 10);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = Config::from_toml_str(
        r#"
        [service]
        name = "pedro-ops"
        "#,
    )
    .unwrap();
    assert_eq!(config.service.name, "pedro-ops");
    assert_eq!(config.service.version, version_string());
    assert_eq!(config.histograms, Config::default().histograms);
}

#[test]
fn custom_buckets() {
    let config = Config::from_toml_str(
        r#"
        [histograms]
        latency_ms = [1.0, 10.0, 100.0]
        size_bytes = [512.0, 4096.0]
        "#,
    )
    .unwrap();
    assert_eq!(config.histograms.latency_ms, vec![1.0, 10.0, 100.0]);
    assert_eq!(config.histograms.size_bytes, vec![512.0, 4096.0]);
}

#[test]
fn unsorted_buckets_are_rejected() {
    let err = Config::from_toml_str(
        r#"
        [histograms]
        latency_ms = [10.0, 1.0]
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, TokenmeterError::Configuration(msg) if msg.contains("latency_ms")));
}

#[test]
fn empty_buckets_are_rejected() {
    let err = Config::from_toml_str("[histograms]\nsize_bytes = []\n").unwrap_err();
    assert!(matches!(err, TokenmeterError::Configuration(_)));
}

#[test]
fn invalid_toml_is_configuration_error() {
    let err = Config::from_toml_str("[service\nname = 1").unwrap_err();
    assert!(matches!(err, TokenmeterError::Configuration(_)));
}

#[test]
fn load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[service]\nname = \"from-file\"\nversion = \"9.9.9\"").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.service.name, "from-file");
    assert_eq!(config.service.version, "9.9.9");
}

#[test]
fn load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn histogram_config_validates_on_its_own() {
    let mut histograms = Config::default().histograms;
    assert!(histograms.validate().is_ok());

    histograms.size_bytes = vec![100.0, 100.0];
    let err = histograms.validate().unwrap_err();
    assert!(matches!(err, TokenmeterError::Configuration(msg) if msg.contains("size_bytes")));
}
