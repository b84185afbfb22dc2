use crate::audio::error::AudioError;
use tracing::{debug, trace};

const LOG_TARGET: &str = "spdif_bridge::audio::output";

/// Sample width every sink is opened with.
pub const SINK_BITS: u16 = 16;

/// How the bytes written to a sink are to be interpreted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFraming {
    Pcm,
    /// IEC 61937 bursts in a 16-bit PCM carrier, for a decoding receiver.
    Iec61937,
}

/// Parameters a sink is bound to when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkParams {
    pub bits: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub framing: SinkFraming,
}

impl SinkParams {
    pub fn pcm(channels: u16, sample_rate: u32) -> Self {
        SinkParams {
            bits: SINK_BITS,
            channels,
            sample_rate,
            framing: SinkFraming::Pcm,
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits as usize / 8)
    }
}

/// An open physical output. Dropping it closes the device.
pub trait OutputSink {
    fn write(&mut self, frame: &[u8]) -> Result<(), AudioError>;
}

/// Discards everything written to it.
pub struct NullSink {
    device_name: String,
    written: usize,
}

impl NullSink {
    pub fn open(device_name: &str, params: SinkParams) -> Self {
        debug!(target: LOG_TARGET, "Opened null sink '{}' with {:?}", device_name, params);
        NullSink {
            device_name: device_name.to_string(),
            written: 0,
        }
    }
}

impl OutputSink for NullSink {
    fn write(&mut self, frame: &[u8]) -> Result<(), AudioError> {
        self.written += frame.len();
        trace!(target: LOG_TARGET, "Null sink '{}' discarded {} bytes ({} total)", self.device_name, frame.len(), self.written);
        Ok(())
    }
}
