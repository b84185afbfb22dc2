//! Integration tests for configuration management
//!
//! These tests verify that settings saved to disk come back intact and feed
//! the supervisor configuration correctly.

use spdif_bridge::audio::SupervisorConfig;
use spdif_bridge::config::{OutputDriver, Settings};
use std::error::Error;
use std::time::Duration;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    /// Test complete configuration workflow
    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("nested").join("config.json");

        let mut settings = Settings::default();
        settings.driver = OutputDriver::Null;
        settings.capture_device = Some("hw:CARD=SPDIF,DEV=0".to_string());
        settings.primary_device = "surround51".to_string();
        settings.passthrough_device = Some("iec958:CARD=HDMI".to_string());
        settings.retry_delay_ms = 250;

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded, settings);

        let mut updated = loaded;
        updated.passthrough_device = None;
        updated.save(&config_path)?;

        let reloaded = Settings::load(&config_path)?;
        assert!(reloaded.passthrough_device.is_none());
        assert_eq!(reloaded.primary_device, "surround51");

        Ok(())
    }

    /// Test mode is never written to disk
    #[test]
    fn test_test_mode_is_not_persisted() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let settings = Settings {
            test_mode: true,
            ..Settings::default()
        };
        settings.save(&config_path)?;

        assert!(!std::fs::read_to_string(&config_path)?.contains("test_mode"));
        assert!(!Settings::load(&config_path)?.test_mode);
        Ok(())
    }

    #[test]
    fn test_supervisor_config_from_settings() {
        let settings = Settings {
            capture_device: Some("hw:1,0".to_string()),
            passthrough_device: Some("iec958".to_string()),
            retry_delay_ms: 1500,
            trace: true,
            ..Settings::default()
        };

        let config = SupervisorConfig::from(&settings);
        assert_eq!(config.primary_device, "default");
        assert_eq!(config.passthrough_device.as_deref(), Some("iec958"));
        assert_eq!(config.retry_delay, Duration::from_millis(1500));
        assert!(config.trace);
    }

    /// Test invalid configuration handling
    #[test]
    fn test_invalid_config_validation() {
        let no_mode = Settings::default();
        let result = no_mode.validate();
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("please specify either input device or testing mode"));
        }

        let empty_capture = Settings {
            capture_device: Some(String::new()),
            ..Settings::default()
        };
        assert!(empty_capture.validate().is_err());
    }
}
