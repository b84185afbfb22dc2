//! Surround decoding through the system libavcodec.
//!
//! AC-3, E-AC-3, DTS and AAC bursts carry complete codec frames, so each
//! payload is sent to libavcodec as one packet and every frame it returns is
//! interleaved into S16LE. TrueHD arrives wrapped in MAT frames, which
//! libavcodec's TrueHD decoder does not unpack, so it is not offered here.

use super::codec::CodecId;
use super::decoder::{DecodedFormat, FrameDecoder};
use super::iec61937::Burst;
use crate::audio::error::AudioError;
use ffmpeg_next as ffmpeg;
use ffmpeg::codec::Id;
use ffmpeg::format::sample::Type as SampleLayout;
use ffmpeg::format::Sample;
use tracing::{debug, trace};

const LOG_TARGET: &str = "spdif_bridge::spdif::ffmpeg_decoder";

fn codec_id(codec: CodecId) -> Option<Id> {
    match codec {
        CodecId::Ac3 => Some(Id::AC3),
        CodecId::Eac3 => Some(Id::EAC3),
        CodecId::Dts => Some(Id::DTS),
        CodecId::Aac => Some(Id::AAC),
        _ => None,
    }
}

pub struct FfmpegFrameDecoder {
    codec: CodecId,
    decoder: ffmpeg::decoder::Audio,
    frame: ffmpeg::frame::Audio,
}

impl FfmpegFrameDecoder {
    /// Opens libavcodec's decoder for `codec`. Codecs libavcodec does not
    /// know fail with [`AudioError::UnsupportedCodec`].
    pub fn new(codec: CodecId) -> Result<Self, AudioError> {
        let id = codec_id(codec).ok_or(AudioError::UnsupportedCodec(codec.name()))?;
        ffmpeg::init().map_err(|e| AudioError::InitializationError(format!("libavcodec init failed: {}", e)))?;
        let av_codec = ffmpeg::decoder::find(id).ok_or(AudioError::UnsupportedCodec(codec.name()))?;
        let decoder = ffmpeg::codec::context::Context::new_with_codec(av_codec)
            .decoder()
            .audio()
            .map_err(|e| AudioError::InitializationError(format!("cannot open {} decoder: {}", codec, e)))?;
        debug!(target: LOG_TARGET, "libavcodec decoder created for {}", codec);
        Ok(FfmpegFrameDecoder {
            codec,
            decoder,
            frame: ffmpeg::frame::Audio::empty(),
        })
    }
}

impl FrameDecoder for FfmpegFrameDecoder {
    fn codec(&self) -> CodecId {
        self.codec
    }

    fn decode(&mut self, burst: &Burst, out: &mut Vec<u8>) -> Result<DecodedFormat, AudioError> {
        let packet = ffmpeg::Packet::copy(&burst.payload);
        self.decoder
            .send_packet(&packet)
            .map_err(|e| AudioError::DecodingError(format!("{} packet rejected: {}", self.codec, e)))?;

        let mut format = None;
        while self.decoder.receive_frame(&mut self.frame).is_ok() {
            append_s16le(&self.frame, out)?;
            trace!(target: LOG_TARGET, "Decoded {} frames ({} Hz, {} ch)", self.frame.samples(), self.frame.rate(), self.frame.channels());
            format = Some(DecodedFormat {
                channels: self.frame.channels(),
                sample_rate: self.frame.rate(),
                layout: None,
                unconsumed: 0,
            });
        }
        format.ok_or_else(|| AudioError::DecodingError(format!("{} decoder has no audio yet", self.codec)))
    }
}

/// Interleaves a decoded frame into S16LE bytes appended to `out`.
fn append_s16le(frame: &ffmpeg::frame::Audio, out: &mut Vec<u8>) -> Result<(), AudioError> {
    let format = frame.format();
    let (width, layout) = match format {
        Sample::I16(layout) => (2, layout),
        Sample::I32(layout) | Sample::F32(layout) => (4, layout),
        Sample::F64(layout) => (8, layout),
        other => return Err(AudioError::DecodingError(format!("unsupported sample format {:?}", other))),
    };
    let channels = frame.channels() as usize;
    out.reserve(frame.samples() * channels * 2);

    for n in 0..frame.samples() {
        for ch in 0..channels {
            let (plane, index) = match layout {
                SampleLayout::Planar => (ch, n),
                SampleLayout::Packed => (0, n * channels + ch),
            };
            let at = index * width;
            let bytes = frame
                .data(plane)
                .get(at..at + width)
                .ok_or_else(|| AudioError::DecodingError("decoded frame shorter than announced".to_string()))?;
            out.extend_from_slice(&to_s16(format, bytes).to_le_bytes());
        }
    }
    Ok(())
}

fn to_s16(format: Sample, bytes: &[u8]) -> i16 {
    match format {
        Sample::I16(_) => i16::from_ne_bytes(array(bytes)),
        Sample::I32(_) => (i32::from_ne_bytes(array(bytes)) >> 16) as i16,
        Sample::F32(_) => scale(f32::from_ne_bytes(array(bytes)) as f64),
        Sample::F64(_) => scale(f64::from_ne_bytes(array(bytes))),
        _ => 0,
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn scale(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
}
