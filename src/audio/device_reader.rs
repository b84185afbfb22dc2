use crate::audio::error::AudioError;
use crate::audio::hex_trace::HexTrace;
use bytes::Bytes;
use std::io::Write;
use tracing::{trace, warn};

const LOG_TARGET: &str = "spdif_bridge::audio::device_reader";

/// Frame-oriented capture API: each call hands over the next captured period.
pub trait FrameSource {
    /// Returns the next frame, or `Ok(None)` once the device has no more data.
    fn next_frame(&mut self) -> Result<Option<Bytes>, AudioError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Bytes>, AudioError> {
        (**self).next_frame()
    }
}

/// Byte-range reads as a container parser wants them.
pub trait ByteSource {
    /// Fills `buf` as far as possible. `Ok(0)` means end of stream.
    fn pull(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;
}

/// Bridges a [`FrameSource`] to [`ByteSource`] reads, keeping the current
/// frame and the offset consumed from it.
pub struct DeviceReader<S> {
    source: S,
    frame: Bytes,
    offset: usize,
    deferred: Option<AudioError>,
    trace: Option<HexTrace<Box<dyn Write>>>,
}

impl<S: FrameSource> DeviceReader<S> {
    pub fn new(source: S) -> Self {
        DeviceReader {
            source,
            frame: Bytes::new(),
            offset: 0,
            deferred: None,
            trace: None,
        }
    }

    /// Mirrors every delivered byte to `out` as a hex dump.
    pub fn with_trace(mut self, out: Box<dyn Write>) -> Self {
        self.trace = Some(HexTrace::new(out));
        self
    }
}

impl<S: FrameSource> ByteSource for DeviceReader<S> {
    fn pull(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }

        let mut delivered = 0;
        while delivered < buf.len() {
            if self.offset >= self.frame.len() {
                match self.source.next_frame() {
                    Ok(Some(frame)) => {
                        trace!(target: LOG_TARGET, "Fetched capture frame of {} bytes", frame.len());
                        self.frame = frame;
                        self.offset = 0;
                        continue;
                    }
                    Ok(None) => break,
                    Err(e) if delivered == 0 => return Err(e),
                    Err(e) => {
                        // Hand out what was already copied; the failure surfaces on the next pull.
                        self.deferred = Some(e);
                        break;
                    }
                }
            }

            let n = (buf.len() - delivered).min(self.frame.len() - self.offset);
            buf[delivered..delivered + n].copy_from_slice(&self.frame[self.offset..self.offset + n]);
            self.offset += n;
            delivered += n;
        }

        if let Some(trace) = self.trace.as_mut() {
            if let Err(e) = trace.record(&buf[..delivered]) {
                warn!(target: LOG_TARGET, "Disabling data trace after write failure: {}", e);
                self.trace = None;
            }
        }
        Ok(delivered)
    }
}

impl<S> Drop for DeviceReader<S> {
    fn drop(&mut self) {
        if let Some(trace) = self.trace.as_mut() {
            let _ = trace.finish();
        }
    }
}
