// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use qrsnap::Config;
use std::path::PathBuf;

fn temp_config_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("qrsnap-test-{}-{}", std::process::id(), name))
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.device_path.is_none(),
        "No device should be pinned by default"
    );
    assert_eq!(config.capture.width, 640);
    assert_eq!(config.capture.height, 480);
    assert!(
        config.jpeg_quality > 0 && config.jpeg_quality <= 100,
        "JPEG quality should be a valid percentage"
    );
}

#[test]
fn test_config_save_and_load() {
    let path = temp_config_path("roundtrip").join("config.json");

    let mut config = Config::default();
    config.device_path = Some("/dev/video2".to_string());
    config.capture.width = 1280;
    config.capture.height = 720;

    config.save_to(&path).expect("Config should save");
    let loaded = Config::load_from(&path);

    assert_eq!(loaded, config, "Loaded config should match the saved one");

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_config_load_missing_file_uses_defaults() {
    let path = temp_config_path("missing").join("config.json");

    let config = Config::load_from(&path);
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_invalid_json_uses_defaults() {
    let dir = temp_config_path("invalid");
    let path = dir.join("config.json");
    std::fs::create_dir_all(&dir).expect("temp dir should be writable");
    std::fs::write(&path, "{ not valid json").expect("temp file should be writable");

    let config = Config::load_from(&path);
    assert_eq!(config, Config::default());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_config_partial_file_fills_defaults() {
    let dir = temp_config_path("partial");
    let path = dir.join("config.json");
    std::fs::create_dir_all(&dir).expect("temp dir should be writable");
    std::fs::write(&path, r#"{ "jpeg_quality": 80 }"#).expect("temp file should be writable");

    let config = Config::load_from(&path);
    assert_eq!(config.jpeg_quality, 80);
    assert_eq!(config.capture, Config::default().capture);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_capture_format_conversion() {
    let mut config = Config::default();
    config.capture.width = 1920;
    config.capture.height = 1080;
    config.capture.framerate = 60;

    let format = config.capture_format();
    assert_eq!(format.width, 1920);
    assert_eq!(format.height, 1080);
    assert_eq!(format.framerate.as_int(), 60);
}
