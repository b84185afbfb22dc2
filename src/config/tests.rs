//! Tests for configuration management module

use super::*;
use std::fs;
use tempfile::tempdir;

fn bridging() -> Settings {
    Settings {
        capture_device: Some("hw:1,0".to_string()),
        ..Settings::default()
    }
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.driver, OutputDriver::Alsa);
    assert!(settings.capture_device.is_none());
    assert_eq!(settings.primary_device, "default");
    assert!(settings.passthrough_device.is_none());
    assert_eq!(settings.retry_delay_ms, 1000);
    assert_eq!(settings.period_frames, 1536);
    assert!(!settings.trace);
    assert!(!settings.test_mode);
}

#[test]
fn test_load_missing_file_gives_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let loaded = Settings::load(&dir.path().join("absent.json"))?;
    assert_eq!(loaded, Settings::default());
    Ok(())
}

#[test]
fn test_load_partial_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{ "driver": "null", "passthrough_device": "iec958:CARD=1" }"#)?;

    let loaded = Settings::load(&config_path)?;
    assert_eq!(loaded.driver, OutputDriver::Null);
    assert_eq!(loaded.passthrough_device.as_deref(), Some("iec958:CARD=1"));
    assert_eq!(loaded.primary_device, "default");
    assert_eq!(loaded.retry_delay_ms, 1000);
    Ok(())
}

#[test]
fn test_load_rejects_bad_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{ "driver": "pulse" }"#)?;
    assert!(matches!(Settings::load(&config_path), Err(ConfigError::ParseError(_))));
    Ok(())
}

#[test]
fn test_settings_validation() {
    assert!(bridging().validate().is_ok());

    let test_mode = Settings { test_mode: true, ..Settings::default() };
    assert!(test_mode.validate().is_ok());

    let neither = Settings::default();
    let err = neither.validate().unwrap_err();
    assert!(err.to_string().contains("either input device or testing mode"));

    let both = Settings { test_mode: true, ..bridging() };
    assert!(both.validate().is_err());

    let empty_output = Settings { primary_device: " ".to_string(), ..bridging() };
    assert!(empty_output.validate().is_err());

    let empty_passthrough = Settings { passthrough_device: Some(String::new()), ..bridging() };
    assert!(empty_passthrough.validate().is_err());

    let no_period = Settings { period_frames: 0, ..bridging() };
    assert!(no_period.validate().is_err());
}

#[test]
fn test_default_path() {
    let path = Settings::default_path();
    assert!(path.to_str().unwrap().contains(".config/spdif-bridge/config.json"));
}
