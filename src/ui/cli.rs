//! Command-line interface implementation

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::{OutputDriver, Settings};

/// Command-line arguments for spdif-bridge
#[derive(Parser, Debug)]
#[command(author, version, about = "Bridge an S/PDIF capture device to ALSA, following codec changes", long_about = None)]
pub struct Args {
    /// Output audio backend
    #[arg(short = 'd', long, value_enum, env = "SPDIF_BRIDGE_DRIVER")]
    pub driver: Option<OutputDriver>,

    /// ALSA capture device carrying the S/PDIF signal, e.g. hw:1,0
    #[arg(short = 'i', long = "input", env = "SPDIF_BRIDGE_INPUT", conflicts_with = "test")]
    pub input: Option<String>,

    /// Primary output device (PCM)
    #[arg(short = 'o', long = "output", env = "SPDIF_BRIDGE_OUTPUT")]
    pub output: Option<String>,

    /// Passthrough output device for compressed streams
    #[arg(short = 'p', long, env = "SPDIF_BRIDGE_PASSTHROUGH")]
    pub passthrough: Option<String>,

    /// Play a test tone on the primary device and exit
    #[arg(short = 't', long)]
    pub test: bool,

    /// Hex-dump captured data and log at debug level
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, env = "SPDIF_BRIDGE_CONFIG")]
    pub config: Option<String>,
}

/// CLI front end: parsed arguments plus usage reporting
pub struct Cli {
    pub args: Args,
}

impl Cli {
    /// Parse the process arguments
    pub fn new() -> Self {
        Cli {
            args: Args::parse(),
        }
    }

    /// Config file named on the command line, or the default location
    pub fn config_path(&self) -> PathBuf {
        match &self.args.config {
            Some(path) => PathBuf::from(path),
            None => Settings::default_path(),
        }
    }

    /// Overlay command-line values on settings loaded from file
    pub fn apply(&self, mut settings: Settings) -> Settings {
        let args = &self.args;
        if let Some(driver) = args.driver {
            settings.driver = driver;
        }
        if let Some(input) = &args.input {
            settings.capture_device = Some(input.clone());
        }
        if let Some(output) = &args.output {
            settings.primary_device = output.clone();
        }
        if let Some(passthrough) = &args.passthrough {
            settings.passthrough_device = Some(passthrough.clone());
        }
        if args.test {
            // A capture device from the config file must not veto test mode.
            settings.test_mode = true;
            if args.input.is_none() {
                settings.capture_device = None;
            }
        }
        settings.trace |= args.verbose;
        settings
    }

    /// Print a usage error and exit with a nonzero status
    pub fn usage_error(&self, message: &str) -> ! {
        Args::command().error(ErrorKind::ArgumentConflict, message).exit()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
