use crate::audio::backend::Backend;
use crate::audio::error::AudioError;
use crate::audio::format_state::FormatState;
use crate::audio::output::{OutputSink, SinkFraming, SinkParams, SINK_BITS};
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "spdif_bridge::audio::sink_manager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkRoute {
    Primary,
    Passthrough,
}

/// Compressed streams go to the passthrough device when there is one;
/// everything else goes to the primary device.
pub fn select_route(passthrough_configured: bool, format: &FormatState) -> SinkRoute {
    if passthrough_configured && !format.codec.is_none() {
        SinkRoute::Passthrough
    } else {
        SinkRoute::Primary
    }
}

pub fn params_for(route: SinkRoute, format: &FormatState) -> SinkParams {
    SinkParams {
        bits: SINK_BITS,
        channels: format.channels,
        sample_rate: format.sample_rate,
        framing: match route {
            SinkRoute::Primary => SinkFraming::Pcm,
            SinkRoute::Passthrough => SinkFraming::Iec61937,
        },
    }
}

/// Owns the single output sink of a session.
pub struct SinkManager {
    primary_device: String,
    passthrough_device: Option<String>,
    sink: Option<Box<dyn OutputSink>>,
    bound: Option<(SinkRoute, SinkParams)>,
}

impl SinkManager {
    pub fn new(primary_device: &str, passthrough_device: Option<&str>) -> Self {
        SinkManager {
            primary_device: primary_device.to_string(),
            passthrough_device: passthrough_device.map(str::to_string),
            sink: None,
            bound: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    /// Route and parameters of the open sink.
    pub fn bound(&self) -> Option<(SinkRoute, SinkParams)> {
        self.bound
    }

    /// Closes the open sink, if any.
    pub fn invalidate(&mut self) {
        if let Some(sink) = self.sink.take() {
            debug!(target: LOG_TARGET, "Closing output sink {:?}", self.bound);
            drop(sink);
        }
        self.bound = None;
    }

    /// Opens a sink for `format` unless one is already open.
    pub fn ensure_open<B: Backend + ?Sized>(&mut self, backend: &mut B, format: &FormatState) -> Result<(), AudioError> {
        if self.sink.is_some() {
            return Ok(());
        }
        let route = select_route(self.passthrough_device.is_some(), format);
        let params = params_for(route, format);
        let device = match (route, self.passthrough_device.as_deref()) {
            (SinkRoute::Passthrough, Some(device)) => {
                info!(target: LOG_TARGET, "Using passthrough output device: {}", device);
                device
            }
            _ => {
                info!(target: LOG_TARGET, "Using primary output device: {}", self.primary_device);
                self.primary_device.as_str()
            }
        };
        let sink = backend.open_sink(device, params)?;
        self.sink = Some(sink);
        self.bound = Some((route, params));
        Ok(())
    }

    /// Writes one frame. A failed write closes the sink before the error is
    /// returned.
    pub fn write(&mut self, frame: &[u8]) -> Result<(), AudioError> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| AudioError::InvalidState("no output sink open".to_string()))?;
        if let Err(e) = sink.write(frame) {
            warn!(target: LOG_TARGET, "Could not play audio to output device: {}", e);
            self.invalidate();
            return Err(e);
        }
        Ok(())
    }
}
