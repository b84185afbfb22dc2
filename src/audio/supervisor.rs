use crate::audio::backend::Backend;
use crate::audio::device_reader::{DeviceReader, FrameSource};
use crate::audio::error::AudioError;
use crate::audio::format_state::{FormatState, FormatTracker};
use crate::audio::sink_manager::SinkManager;
use crate::config::Settings;
use crate::spdif::{CodecProbe, ProbeOutcome};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const LOG_TARGET: &str = "spdif_bridge::audio::supervisor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Bootstrapping,
    Streaming,
    Failing,
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub primary_device: String,
    pub passthrough_device: Option<String>,
    pub retry_delay: Duration,
    /// Hex-dump captured bytes to stdout.
    pub trace: bool,
}

impl From<&Settings> for SupervisorConfig {
    fn from(settings: &Settings) -> Self {
        SupervisorConfig {
            primary_device: settings.primary_device.clone(),
            passthrough_device: settings.passthrough_device.clone(),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            trace: settings.trace,
        }
    }
}

/// Why the current attempt is being torn down.
#[derive(Debug)]
struct RetryContext {
    cause: AudioError,
}

/// Drives capture → probe → format tracking → sink, restarting the whole
/// session whenever any stage fails.
pub struct Supervisor<B: Backend> {
    backend: B,
    config: SupervisorConfig,
    state: SupervisorState,
    reader: Option<DeviceReader<Box<dyn FrameSource>>>,
    probe: Option<Box<dyn CodecProbe>>,
    tracker: FormatTracker,
    sinks: SinkManager,
    scratch: Vec<u8>,
    retry: Option<RetryContext>,
    attempts: u64,
}

impl<B: Backend> Supervisor<B> {
    pub fn new(backend: B, config: SupervisorConfig) -> Self {
        let sinks = SinkManager::new(&config.primary_device, config.passthrough_device.as_deref());
        Supervisor {
            backend,
            config,
            state: SupervisorState::Bootstrapping,
            reader: None,
            probe: None,
            tracker: FormatTracker::new(),
            sinks,
            scratch: Vec::new(),
            retry: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn active_format(&self) -> Option<FormatState> {
        self.tracker.active()
    }

    /// Whether any session resource is currently held.
    pub fn holds_resources(&self) -> bool {
        self.reader.is_some() || self.probe.is_some() || self.sinks.is_open()
    }

    /// Runs until the process is killed.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Advances the state machine by one transition or one streamed frame.
    pub fn step(&mut self) -> SupervisorState {
        let next = match self.state {
            SupervisorState::Bootstrapping => match self.bootstrap() {
                Ok(()) => SupervisorState::Streaming,
                Err(e) => self.begin_failing(e),
            },
            SupervisorState::Streaming => match self.stream_once() {
                Ok(()) => SupervisorState::Streaming,
                Err(e) => self.begin_failing(e),
            },
            SupervisorState::Failing => {
                self.fail();
                SupervisorState::Bootstrapping
            }
        };
        if next != self.state {
            debug!(target: LOG_TARGET, "{:?} -> {:?}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Opens the capture session and probe for a new attempt.
    pub fn bootstrap(&mut self) -> Result<(), AudioError> {
        self.attempts += 1;
        self.tracker = FormatTracker::new();

        let capture = self.backend.open_capture()?;
        let reader = DeviceReader::new(capture);
        self.reader = Some(if self.config.trace {
            reader.with_trace(Box::new(std::io::stdout()))
        } else {
            reader
        });
        self.probe = Some(self.backend.open_probe()?);

        info!(target: LOG_TARGET, "start loop (attempt {})", self.attempts);
        Ok(())
    }

    /// Moves one frame from the capture device to the output sink.
    pub fn stream_once(&mut self) -> Result<(), AudioError> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| AudioError::InvalidState("capture session not open".to_string()))?;
        let probe = self
            .probe
            .as_mut()
            .ok_or_else(|| AudioError::InvalidState("codec probe not open".to_string()))?;

        let next = match probe.probe(reader, &mut self.scratch)? {
            ProbeOutcome::NeedsCodec(codec) => {
                if let Err(e) = probe.load_codec(codec) {
                    warn!(target: LOG_TARGET, "Could not load codec {}.", codec);
                    return Err(e);
                }
                return Ok(());
            }
            ProbeOutcome::Decoded(frame) => {
                let left = probe.unconsumed();
                if left != 0 {
                    warn!(target: LOG_TARGET, "still some bytes left {}", left);
                }
                FormatState::from_decoded(&frame)
            }
            ProbeOutcome::RawPassthrough => FormatState::RAW_PCM,
        };

        if self.tracker.observe(next).is_changed() {
            self.sinks.invalidate();
        }
        self.sinks.ensure_open(&mut self.backend, &next)?;
        self.sinks.write(&self.scratch)
    }

    fn begin_failing(&mut self, cause: AudioError) -> SupervisorState {
        error!(target: LOG_TARGET, "Session failed in {:?}: {}", self.state, cause);
        self.retry = Some(RetryContext { cause });
        SupervisorState::Failing
    }

    /// Releases every session resource, waits out the backoff and announces
    /// the retry.
    pub fn fail(&mut self) {
        if let Some(probe) = self.probe.take() {
            drop(probe);
            debug!(target: LOG_TARGET, "Codec probe closed");
        }
        if let Some(reader) = self.reader.take() {
            drop(reader);
            debug!(target: LOG_TARGET, "Capture session closed");
        }
        self.sinks.invalidate();

        std::thread::sleep(self.config.retry_delay);
        match self.retry.take() {
            Some(ctx) => warn!(target: LOG_TARGET, "retrying after: {}", ctx.cause),
            None => warn!(target: LOG_TARGET, "retrying."),
        }
    }
}
