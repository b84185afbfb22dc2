use super::codec::CodecId;
use super::format_converter::append_s16le;
use super::iec61937::Burst;
use crate::audio::error::AudioError;
use crate::audio::format_state::{RAW_PCM_CHANNELS, RAW_PCM_SAMPLE_RATE};
use symphonia::core::audio::Channels;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3};
use symphonia::core::formats::Packet;
use tracing::{debug, trace, warn};

const LOG_TARGET: &str = "spdif_bridge::spdif::decoder";

/// Format of the playable frame a decoder produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub layout: Option<Channels>,
    /// Payload bytes the decoder did not consume.
    pub unconsumed: usize,
}

/// Turns one burst into bytes ready for an output sink.
pub trait FrameDecoder {
    fn codec(&self) -> CodecId;

    /// Decodes `burst`, appending the playable frame to `out`.
    fn decode(&mut self, burst: &Burst, out: &mut Vec<u8>) -> Result<DecodedFormat, AudioError>;
}

/// Re-emits bursts verbatim for a receiver that decodes them itself.
///
/// Each burst is zero-stuffed up to its repetition period so the carrier
/// keeps the 48 kHz stereo timing it arrived with.
pub struct BitstreamDecoder {
    codec: CodecId,
}

impl BitstreamDecoder {
    pub fn new(codec: CodecId) -> Self {
        debug!(target: LOG_TARGET, "Bitstream passthrough enabled for {}", codec);
        BitstreamDecoder { codec }
    }
}

impl FrameDecoder for BitstreamDecoder {
    fn codec(&self) -> CodecId {
        self.codec
    }

    fn decode(&mut self, burst: &Burst, out: &mut Vec<u8>) -> Result<DecodedFormat, AudioError> {
        out.extend_from_slice(&burst.raw);
        let period = burst.period_bytes();
        if burst.raw.len() < period {
            out.resize(out.len() + period - burst.raw.len(), 0);
        }
        Ok(DecodedFormat {
            channels: RAW_PCM_CHANNELS,
            sample_rate: RAW_PCM_SAMPLE_RATE,
            layout: None,
            unconsumed: 0,
        })
    }
}

/// Stands in for a codec nothing here can decode: every burst becomes one
/// repetition period of stereo silence, so the session stays up and the
/// carrier timing is kept.
pub struct MutedDecoder {
    codec: CodecId,
}

impl MutedDecoder {
    pub fn new(codec: CodecId) -> Self {
        warn!(target: LOG_TARGET, "No decoder available for {}, muting until the stream changes", codec);
        MutedDecoder { codec }
    }
}

impl FrameDecoder for MutedDecoder {
    fn codec(&self) -> CodecId {
        self.codec
    }

    fn decode(&mut self, burst: &Burst, out: &mut Vec<u8>) -> Result<DecodedFormat, AudioError> {
        out.resize(out.len() + burst.period_bytes(), 0);
        Ok(DecodedFormat {
            channels: RAW_PCM_CHANNELS,
            sample_rate: RAW_PCM_SAMPLE_RATE,
            layout: None,
            unconsumed: 0,
        })
    }
}

/// Opens a decoder producing S16LE PCM for `codec`.
///
/// MPEG-1 audio goes through Symphonia. The surround codecs need the
/// `ffmpeg` feature; without it, or when libavcodec has no decoder for the
/// codec, this fails with [`AudioError::UnsupportedCodec`].
pub fn open_pcm_decoder(codec: CodecId) -> Result<Box<dyn FrameDecoder>, AudioError> {
    match codec {
        CodecId::Mp1 | CodecId::Mp2 | CodecId::Mp3 => Ok(Box::new(SymphoniaFrameDecoder::new(codec)?)),
        _ => open_surround_decoder(codec),
    }
}

#[cfg(feature = "ffmpeg")]
fn open_surround_decoder(codec: CodecId) -> Result<Box<dyn FrameDecoder>, AudioError> {
    Ok(Box::new(super::ffmpeg_decoder::FfmpegFrameDecoder::new(codec)?))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_surround_decoder(codec: CodecId) -> Result<Box<dyn FrameDecoder>, AudioError> {
    Err(AudioError::UnsupportedCodec(codec.name()))
}

/// Decodes MPEG-1 audio bursts to S16LE through Symphonia's codec registry.
pub struct SymphoniaFrameDecoder {
    codec: CodecId,
    decoder: Box<dyn Decoder>,
}

impl SymphoniaFrameDecoder {
    /// Instantiates a decoder for `codec`. Fails with
    /// [`AudioError::UnsupportedCodec`] for codecs Symphonia cannot decode.
    pub fn new(codec: CodecId) -> Result<Self, AudioError> {
        let codec_type = match codec {
            CodecId::Mp1 => CODEC_TYPE_MP1,
            CodecId::Mp2 => CODEC_TYPE_MP2,
            CodecId::Mp3 => CODEC_TYPE_MP3,
            other => return Err(AudioError::UnsupportedCodec(other.name())),
        };
        let mut params = CodecParameters::new();
        params.for_codec(codec_type);
        let decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;
        debug!(target: LOG_TARGET, "Symphonia decoder created for {}", codec);
        Ok(SymphoniaFrameDecoder { codec, decoder })
    }
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn codec(&self) -> CodecId {
        self.codec
    }

    fn decode(&mut self, burst: &Burst, out: &mut Vec<u8>) -> Result<DecodedFormat, AudioError> {
        let packet = Packet::new_from_slice(0, 0, 0, &burst.payload);
        let decoded = self.decoder.decode(&packet)?;
        let spec = *decoded.spec();
        let frames = append_s16le(decoded, out).ok_or_else(|| {
            AudioError::DecodingError(format!("cannot convert {} output to S16", self.codec))
        })?;
        trace!(target: LOG_TARGET, "Decoded {} frames ({} Hz, {} ch)", frames, spec.rate, spec.channels.count());
        Ok(DecodedFormat {
            channels: spec.channels.count() as u16,
            sample_rate: spec.rate,
            layout: Some(spec.channels),
            unconsumed: 0,
        })
    }
}
