use crate::audio::device_reader::FrameSource;
use crate::audio::error::AudioError;
use crate::audio::format_state::{RAW_PCM_CHANNELS, RAW_PCM_SAMPLE_RATE};
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};
use bytes::Bytes;
use std::ffi::CString;
use tracing::{debug, info, instrument, warn};

const LOG_TARGET: &str = "spdif_bridge::audio::alsa_capture";

/// ALSA capture PCM delivering the raw S/PDIF carrier one period at a time.
pub struct AlsaCapture {
    device_name: String,
    pcm: PCM,
    frame_bytes: usize,
    period_frames: usize,
}

impl AlsaCapture {
    /// Opens `device_name` for blocking S16LE stereo capture at 48 kHz.
    #[instrument(skip_all, fields(device = %device_name))]
    pub fn open(device_name: &str, period_frames: usize) -> Result<Self, AudioError> {
        let device = CString::new(device_name)
            .map_err(|e| AudioError::InitializationError(format!("Invalid capture device name: {}", e)))?;
        let pcm = PCM::open(&device, Direction::Capture, false)?;

        let period_frames = {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(RAW_PCM_CHANNELS as u32)?;
            hwp.set_rate(RAW_PCM_SAMPLE_RATE, ValueOr::Nearest)?;
            hwp.set_period_size_near(period_frames as Frames, ValueOr::Nearest)?;
            pcm.hw_params(&hwp)?;
            hwp.get_period_size()? as usize
        };
        debug!(target: LOG_TARGET, "ALSA capture period negotiated at {} frames", period_frames);

        info!(target: LOG_TARGET, "Opened capture device '{}'", device_name);
        Ok(AlsaCapture {
            device_name: device_name.to_string(),
            pcm,
            frame_bytes: RAW_PCM_CHANNELS as usize * 2,
            period_frames: period_frames.max(1),
        })
    }
}

impl FrameSource for AlsaCapture {
    fn next_frame(&mut self) -> Result<Option<Bytes>, AudioError> {
        let mut buf = vec![0u8; self.period_frames * self.frame_bytes];
        let io = self.pcm.io_bytes();
        let mut recovered = false;
        loop {
            match io.readi(&mut buf) {
                Ok(frames) => {
                    buf.truncate(frames * self.frame_bytes);
                    return Ok(Some(Bytes::from(buf)));
                }
                Err(e) if e.errno() == Errno::EPIPE && !recovered => {
                    warn!(target: LOG_TARGET, "ALSA capture overrun on '{}', recovering", self.device_name);
                    self.pcm.recover(libc::EPIPE, true)?;
                    recovered = true;
                }
                Err(e) => {
                    return Err(AudioError::CaptureError(format!("read from '{}' failed: {}", self.device_name, e)));
                }
            }
        }
    }
}

impl Drop for AlsaCapture {
    fn drop(&mut self) {
        debug!(target: LOG_TARGET, "Closing capture device '{}'", self.device_name);
        let _ = self.pcm.drop();
    }
}
