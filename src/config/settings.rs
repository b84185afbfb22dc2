//! Application settings and configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output audio backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputDriver {
    /// ALSA playback devices
    Alsa,
    /// Discard all output
    Null,
}

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Output driver used for both sinks
    #[serde(default = "default_driver")]
    pub driver: OutputDriver,
    /// ALSA capture device carrying the S/PDIF signal
    #[serde(default)]
    pub capture_device: Option<String>,
    /// Device receiving PCM
    #[serde(default = "default_primary_device")]
    pub primary_device: String,
    /// Device receiving compressed bitstreams untouched
    #[serde(default)]
    pub passthrough_device: Option<String>,
    /// Pause between a session failure and the next attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Capture period requested from ALSA, in frames
    #[serde(default = "default_period_frames")]
    pub period_frames: usize,
    /// Hex-dump captured data
    #[serde(default)]
    pub trace: bool,
    /// Play a test tone instead of bridging; set from the command line only
    #[serde(skip)]
    pub test_mode: bool,
}

fn default_driver() -> OutputDriver {
    OutputDriver::Alsa
}

fn default_primary_device() -> String {
    "default".to_string()
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_period_frames() -> usize {
    1536
}

/// Error types for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            driver: default_driver(),
            capture_device: None,
            primary_device: default_primary_device(),
            passthrough_device: None,
            retry_delay_ms: default_retry_delay_ms(),
            period_frames: default_period_frames(),
            trace: false,
            test_mode: false,
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("spdif-bridge").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_mode == self.capture_device.is_some() {
            return Err(ConfigError::ValidationError(
                "please specify either input device or testing mode".to_string(),
            ));
        }

        let names = [Some(&self.primary_device), self.capture_device.as_ref(), self.passthrough_device.as_ref()];
        if names.iter().flatten().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError("Device names cannot be empty".to_string()));
        }

        if self.period_frames == 0 {
            return Err(ConfigError::ValidationError("Capture period must be at least one frame".to_string()));
        }

        Ok(())
    }
}
