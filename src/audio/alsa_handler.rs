use crate::audio::error::AudioError;
use crate::audio::output::{OutputSink, SinkFraming, SinkParams, SINK_BITS};
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, HwParams, State as PcmState, PCM};
use alsa::{Direction, ValueOr};
use std::ffi::CString;
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "spdif_bridge::audio::alsa_handler";

/// An ALSA playback PCM bound to one set of sink parameters.
pub struct AlsaPcmHandler {
    device_name: String,
    pcm: Option<PCM>,
    params: SinkParams,
}

impl AlsaPcmHandler {
    /// Opens `device_name` for blocking S16LE interleaved playback.
    #[instrument(skip_all, fields(device = %device_name, rate = params.sample_rate, channels = params.channels))]
    pub fn open(device_name: &str, params: SinkParams) -> Result<Self, AudioError> {
        info!(
            target: LOG_TARGET,
            "Opening ALSA PCM device '{}': {} bit, {} ch, {} Hz, {:?}",
            device_name, params.bits, params.channels, params.sample_rate, params.framing
        );
        if params.bits != SINK_BITS {
            return Err(AudioError::InitializationError(format!("unsupported sample width {}", params.bits)));
        }

        let device = CString::new(device_name)
            .map_err(|e| AudioError::InitializationError(format!("Invalid device name: {}", e)))?;
        let pcm = PCM::open(&device, Direction::Playback, false)?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(params.channels as u32)?;

            let actual_rate = match hwp.set_rate_near(params.sample_rate, ValueOr::Nearest) {
                Ok(_) => hwp.get_rate()?,
                Err(e) => {
                    error!(target: LOG_TARGET, "Failed to set ALSA rate near {}: {}", params.sample_rate, e);
                    return Err(AudioError::AlsaError(format!(
                        "Failed to set sample rate {}: {}",
                        params.sample_rate, e
                    )));
                }
            };
            if actual_rate != params.sample_rate {
                // Resampling a bitstream destroys it.
                if params.framing == SinkFraming::Iec61937 {
                    return Err(AudioError::SinkError(format!(
                        "passthrough device '{}' cannot run at {} Hz (offered {})",
                        device_name, params.sample_rate, actual_rate
                    )));
                }
                warn!(
                    target: LOG_TARGET,
                    "ALSA rate negotiation: requested={}, actual={}",
                    params.sample_rate, actual_rate
                );
            }
            pcm.hw_params(&hwp)?;

            let swp = pcm.sw_params_current()?;
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            swp.set_start_threshold(buffer_size - period_size)?;
            pcm.sw_params(&swp)?;
            debug!(target: LOG_TARGET, "ALSA software parameters applied (buffer={}, period={}, rate={}).", buffer_size, period_size, actual_rate);
        }

        info!(target: LOG_TARGET, "ALSA initialized successfully.");
        Ok(AlsaPcmHandler {
            device_name: device_name.to_string(),
            pcm: Some(pcm),
            params,
        })
    }

    /// Drops any queued audio and releases the device.
    pub fn close(&mut self) {
        if let Some(pcm) = self.pcm.take() {
            debug!(target: LOG_TARGET, "Closing ALSA PCM device '{}' (state: {:?})...", self.device_name, pcm.state());
            if pcm.state() == PcmState::Running || pcm.state() == PcmState::Prepared {
                if let Err(e) = pcm.drop() {
                    warn!(target: LOG_TARGET, "Error dropping ALSA buffer during close (ignored): {}", e);
                }
            }
        }
    }
}

impl OutputSink for AlsaPcmHandler {
    /// Blocks until the whole frame is queued. Underruns are recovered and
    /// the remaining frames retried.
    fn write(&mut self, frame: &[u8]) -> Result<(), AudioError> {
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("PCM not initialized for writing".to_string()))?;
        let frame_bytes = self.params.bytes_per_frame();
        if frame_bytes == 0 {
            return Err(AudioError::InvalidState("sink opened with zero channels".to_string()));
        }
        let usable = frame.len() - frame.len() % frame_bytes;
        if usable != frame.len() {
            warn!(target: LOG_TARGET, "Dropping {} bytes of partial frame", frame.len() - usable);
        }

        let io = pcm.io_bytes();
        let mut offset = 0;
        while offset < usable {
            match io.writei(&frame[offset..usable]) {
                Ok(frames) => {
                    offset += frames * frame_bytes;
                    trace!(target: LOG_TARGET, "Wrote {} frames to ALSA ({}/{} bytes)", frames, offset, usable);
                }
                Err(e) if e.errno() == Errno::EPIPE => {
                    warn!(target: LOG_TARGET, "ALSA buffer underrun (EPIPE), recovering...");
                    pcm.recover(libc::EPIPE, true)
                        .map_err(|recover_err| AudioError::AlsaError(format!("ALSA recovery failed: {}", recover_err)))?;
                }
                Err(e) => {
                    error!(target: LOG_TARGET, "ALSA write error: {}", e);
                    return Err(AudioError::SinkError(e.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl Drop for AlsaPcmHandler {
    fn drop(&mut self) {
        self.close();
    }
}
