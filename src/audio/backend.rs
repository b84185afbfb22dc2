use crate::audio::alsa_capture::AlsaCapture;
use crate::audio::alsa_handler::AlsaPcmHandler;
use crate::audio::device_reader::FrameSource;
use crate::audio::error::AudioError;
use crate::audio::output::{NullSink, OutputSink, SinkParams};
use crate::config::{OutputDriver, Settings};
use crate::spdif::{CodecProbe, SpdifProbe};

/// Opens the resources a session is built from.
///
/// Every handle returned here is closed by dropping it.
pub trait Backend {
    fn open_capture(&mut self) -> Result<Box<dyn FrameSource>, AudioError>;
    fn open_probe(&mut self) -> Result<Box<dyn CodecProbe>, AudioError>;
    fn open_sink(&mut self, device: &str, params: SinkParams) -> Result<Box<dyn OutputSink>, AudioError>;
}

/// ALSA capture, IEC 61937 probe and the configured output driver.
pub struct HardwareBackend {
    capture_device: Option<String>,
    period_frames: usize,
    driver: OutputDriver,
    passthrough: bool,
}

impl HardwareBackend {
    pub fn new(settings: &Settings) -> Self {
        HardwareBackend {
            capture_device: settings.capture_device.clone(),
            period_frames: settings.period_frames,
            driver: settings.driver,
            passthrough: settings.passthrough_device.is_some(),
        }
    }
}

impl Backend for HardwareBackend {
    fn open_capture(&mut self) -> Result<Box<dyn FrameSource>, AudioError> {
        let device = self
            .capture_device
            .as_deref()
            .ok_or_else(|| AudioError::InitializationError("no capture device configured".to_string()))?;
        Ok(Box::new(AlsaCapture::open(device, self.period_frames)?))
    }

    fn open_probe(&mut self) -> Result<Box<dyn CodecProbe>, AudioError> {
        Ok(Box::new(SpdifProbe::new(self.passthrough)))
    }

    fn open_sink(&mut self, device: &str, params: SinkParams) -> Result<Box<dyn OutputSink>, AudioError> {
        match self.driver {
            OutputDriver::Alsa => Ok(Box::new(AlsaPcmHandler::open(device, params)?)),
            OutputDriver::Null => Ok(Box::new(NullSink::open(device, params))),
        }
    }
}
