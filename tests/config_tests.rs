//! Configuration loading and graceful degradation

use pano_tour::config::CompressionPreset;
use pano_tour::{Config, Error};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();

    let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();

    assert_eq!(config, Config::default());
    assert!(config.verify_admin("admin123"));
}

#[test]
fn test_partial_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
admin_password = "s3cret"
local_store_quota_bytes = 1024

[images.logo]
max_dimension = 256
quality = 0.8

[viewer]
auto_rotate = 0.0
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert!(config.verify_admin("s3cret"));
    assert!(!config.verify_admin("admin123"));
    assert_eq!(config.local_store_quota_bytes, 1024);
    assert_eq!(config.images.logo, CompressionPreset { max_dimension: 256, quality: 0.8 });
    assert_eq!(config.images.panorama, CompressionPreset::PANORAMA);
    assert_eq!(config.viewer.auto_rotate, 0.0);
    assert!(config.viewer.compass);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "admin_password = [").unwrap();

    assert!(matches!(Config::load(Some(&path)), Err(Error::Config(_))));
}
