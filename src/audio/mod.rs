//! Capture, format tracking and output for the S/PDIF bridge

pub mod alsa_capture;
pub mod alsa_handler;
pub mod backend;
pub mod device_reader;
pub mod error;
pub mod format_state;
pub mod hex_trace;
pub mod output;
pub mod sink_manager;
pub mod supervisor;
pub mod tone;

pub use backend::{Backend, HardwareBackend};
pub use error::AudioError;
pub use supervisor::{Supervisor, SupervisorConfig, SupervisorState};
