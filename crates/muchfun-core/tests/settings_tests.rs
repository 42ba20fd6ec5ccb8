use muchfun_core::{
    is_websocket_url, BlendMode, PatternKind, Settings, SmoothingKind, SmoothingPreset,
    DEFAULT_SERVER_ADDRESS,
};
use std::fs;

#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MuchFun").join("settings.json");

    let mut settings = Settings::default();
    settings.server_address = "ws://192.168.1.20:12345".to_string();
    settings.verbose_logging = true;
    settings.mixer.blend_mode = BlendMode::Additive;
    settings.mixer.smoothing = SmoothingPreset::Bouncy.config();
    settings.mixer.pattern.kind = PatternKind::Chaos;
    settings.mixer.audio.sensitivity = 1.4;

    settings.save_to(&path).unwrap();
    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_missing_fields_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{ "verbose_logging": true, "mixer": { "smoothing": { "kind": "Simple" } } }"#,
    )
    .unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert!(loaded.verbose_logging);
    assert_eq!(loaded.server_address, DEFAULT_SERVER_ADDRESS);
    assert_eq!(loaded.mixer.smoothing.kind, SmoothingKind::Simple);
    assert_eq!(loaded.mixer.smoothing.strength, 0.3);
    assert_eq!(loaded.mixer.output_rate_hz, 5.0);
    assert_eq!(loaded.log.max_files, 10);
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(Settings::load_from(&path).is_err());
    assert_eq!(Settings::load_or_default(&path), Settings::default());
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    fs::write(&path, r#"{ "server_address": "http://localhost:12345" }"#).unwrap();
    assert!(Settings::load_from(&path).is_err());

    fs::write(&path, r#"{ "mixer": { "output_rate_hz": 0.0 } }"#).unwrap();
    assert!(Settings::load_from(&path).is_err());
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Settings::load_or_default(&dir.path().join("absent.json"));
    assert_eq!(loaded, Settings::default());
}

#[test]
fn test_websocket_url_check() {
    assert!(is_websocket_url(DEFAULT_SERVER_ADDRESS));
    assert!(is_websocket_url("wss://example.org/buttplug"));
    assert!(!is_websocket_url("ws://"));
    assert!(!is_websocket_url("127.0.0.1:12345"));
    assert!(!is_websocket_url("http://localhost:12345"));
}
