use super::codec::CodecId;
use super::decoder::{open_pcm_decoder, BitstreamDecoder, FrameDecoder, MutedDecoder};
use super::iec61937::{find_preamble, parse_header, Burst, HeaderScan, CARRIER_FRAME_BYTES, HEADER_LEN, PREAMBLE};
use crate::audio::device_reader::ByteSource;
use crate::audio::error::AudioError;
use symphonia::core::audio::Channels;
use symphonia::core::errors::Error as SymphoniaError;
use tracing::{debug, trace, warn};

const LOG_TARGET: &str = "spdif_bridge::spdif::probe";

/// Bytes read per probe window: one AC-3 repetition period.
pub const IO_BUFFER_SIZE: usize = 8 + 1792 + 4344;

/// Largest burst accepted before the stream is considered corrupt.
pub const MAX_BURST_LEN: usize = 1024 * 1024;

/// A compressed frame decoded and ready for the sink. The frame bytes are
/// in the scratch buffer handed to [`CodecProbe::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub codec: CodecId,
    pub channels: u16,
    pub sample_rate: u32,
    pub layout: Option<Channels>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A compressed header was seen but no decoder for it is loaded.
    NeedsCodec(CodecId),
    Decoded(DecodedFrame),
    /// No compressed header; the scratch buffer holds raw PCM.
    RawPassthrough,
}

/// Container parser and decoder seen from the pipeline.
pub trait CodecProbe {
    /// Reads from `source` until one outcome is available. Playable bytes
    /// replace the contents of `scratch`.
    fn probe(&mut self, source: &mut dyn ByteSource, scratch: &mut Vec<u8>) -> Result<ProbeOutcome, AudioError>;

    /// Instantiates the decoder for `codec` after a [`ProbeOutcome::NeedsCodec`].
    fn load_codec(&mut self, codec: CodecId) -> Result<(), AudioError>;

    /// Bytes left unconsumed by the last decoded frame.
    fn unconsumed(&self) -> usize;
}

enum Scan {
    Burst(Burst),
    Raw,
}

/// IEC 61937 demuxer over the captured byte stream.
pub struct SpdifProbe {
    passthrough: bool,
    window: Vec<u8>,
    pending: Option<Burst>,
    decoder: Option<Box<dyn FrameDecoder>>,
    unconsumed: usize,
    /// Carrier bytes left in the last burst's repetition period.
    stuffing: usize,
}

impl SpdifProbe {
    /// With `passthrough` set every codec is forwarded verbatim instead of
    /// decoded.
    pub fn new(passthrough: bool) -> Self {
        SpdifProbe {
            passthrough,
            window: Vec::with_capacity(IO_BUFFER_SIZE),
            pending: None,
            decoder: None,
            unconsumed: 0,
            stuffing: 0,
        }
    }

    /// Pulls until the window holds at least `target` bytes. Returns `false`
    /// if the source ended first.
    fn fill(&mut self, source: &mut dyn ByteSource, target: usize) -> Result<bool, AudioError> {
        while self.window.len() < target {
            let start = self.window.len();
            self.window.resize(target, 0);
            match source.pull(&mut self.window[start..]) {
                Ok(0) => {
                    self.window.truncate(start);
                    return Ok(false);
                }
                Ok(n) => self.window.truncate(start + n),
                Err(e) => {
                    self.window.truncate(start);
                    return Err(e);
                }
            }
        }
        Ok(true)
    }

    fn next_burst(&mut self, source: &mut dyn ByteSource, scratch: &mut Vec<u8>) -> Result<Scan, AudioError> {
        loop {
            let ended = !self.fill(source, IO_BUFFER_SIZE)?;
            if ended && self.window.len() < PREAMBLE.len() {
                return Err(AudioError::CaptureError("capture stream ended".to_string()));
            }

            let Some(at) = find_preamble(&self.window) else {
                // Keep a short tail in case a preamble straddles two windows,
                // and only hand out whole carrier frames.
                let keep = PREAMBLE.len() - 1;
                let usable = self.window.len().saturating_sub(keep);
                let usable = usable - usable % CARRIER_FRAME_BYTES;
                if usable == 0 && ended {
                    return Err(AudioError::CaptureError("capture stream ended".to_string()));
                }
                if self.stuffing > 0 {
                    // Still inside the previous burst's repetition period.
                    let skip = usable.min(self.stuffing);
                    self.window.drain(..skip);
                    self.stuffing -= skip;
                    trace!(target: LOG_TARGET, "Skipped {} stuffing bytes, {} to go", skip, self.stuffing);
                    continue;
                }
                scratch.extend(self.window.drain(..usable));
                return Ok(Scan::Raw);
            };
            self.stuffing = 0;

            if !self.fill(source, at + HEADER_LEN)? {
                return Err(AudioError::CaptureError("capture stream ended inside a burst header".to_string()));
            }
            let header = match parse_header(&self.window[at..]) {
                Some(HeaderScan::Burst(header)) => header,
                Some(HeaderScan::Unknown { pc }) => {
                    trace!(target: LOG_TARGET, "Skipping burst with data type {:#04x}", pc & 0x7F);
                    self.window.drain(..at + HEADER_LEN);
                    continue;
                }
                None => return Err(AudioError::InvalidState("burst header not buffered".to_string())),
            };
            if header.burst_len() > MAX_BURST_LEN {
                return Err(AudioError::DecodingError(format!(
                    "burst of {} bytes exceeds the {} byte limit",
                    header.burst_len(),
                    MAX_BURST_LEN
                )));
            }

            let end = at + header.burst_len();
            // Consume through the end of the last carrier frame the burst touches.
            let consumed = end.next_multiple_of(CARRIER_FRAME_BYTES);
            if !self.fill(source, consumed)? {
                return Err(AudioError::CaptureError("capture stream ended inside a burst".to_string()));
            }
            let burst = Burst::new(header, &self.window[at..end]);
            self.window.drain(..consumed);
            self.stuffing = burst.period_bytes().saturating_sub(consumed - at);
            trace!(target: LOG_TARGET, "Burst {:?} ({} payload bytes) at offset {}", burst.header.data_type, header.payload_len, at);
            return Ok(Scan::Burst(burst));
        }
    }
}

impl CodecProbe for SpdifProbe {
    fn probe(&mut self, source: &mut dyn ByteSource, scratch: &mut Vec<u8>) -> Result<ProbeOutcome, AudioError> {
        scratch.clear();
        loop {
            if let Some(burst) = self.pending.take() {
                let decoder = match self.decoder.as_mut() {
                    Some(decoder) if decoder.codec() == burst.codec => decoder,
                    _ => {
                        let codec = burst.codec;
                        self.pending = Some(burst);
                        return Ok(ProbeOutcome::NeedsCodec(codec));
                    }
                };
                match decoder.decode(&burst, scratch) {
                    Ok(format) => {
                        self.unconsumed = format.unconsumed;
                        return Ok(ProbeOutcome::Decoded(DecodedFrame {
                            codec: burst.codec,
                            channels: format.channels,
                            sample_rate: format.sample_rate,
                            layout: format.layout,
                        }));
                    }
                    Err(e @ (AudioError::SymphoniaError(SymphoniaError::DecodeError(_)) | AudioError::DecodingError(_))) => {
                        warn!(target: LOG_TARGET, "Dropping undecodable {} frame: {}", burst.codec, e);
                        scratch.clear();
                    }
                    Err(e) => return Err(e),
                }
            }

            match self.next_burst(source, scratch)? {
                Scan::Burst(burst) => self.pending = Some(burst),
                Scan::Raw => return Ok(ProbeOutcome::RawPassthrough),
            }
        }
    }

    fn load_codec(&mut self, codec: CodecId) -> Result<(), AudioError> {
        self.decoder = None;
        let decoder: Box<dyn FrameDecoder> = if self.passthrough {
            Box::new(BitstreamDecoder::new(codec))
        } else {
            match open_pcm_decoder(codec) {
                Ok(decoder) => decoder,
                Err(AudioError::UnsupportedCodec(_)) => Box::new(MutedDecoder::new(codec)),
                Err(e) => return Err(e),
            }
        };
        debug!(target: LOG_TARGET, "Loaded decoder for {}", codec);
        self.decoder = Some(decoder);
        Ok(())
    }

    fn unconsumed(&self) -> usize {
        self.unconsumed
    }
}
