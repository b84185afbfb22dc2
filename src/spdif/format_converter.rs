use symphonia::core::audio::AudioBufferRef;
use tracing::warn;

const LOG_TARGET: &str = "spdif_bridge::spdif::format_converter";

/// Interleaves a decoded Symphonia buffer into S16LE bytes appended to `out`.
/// Returns the number of frames written, or `None` if the sample format has
/// no S16 mapping.
pub fn append_s16le(audio_buf_ref: AudioBufferRef, out: &mut Vec<u8>) -> Option<usize> {
    let spec = *audio_buf_ref.spec();
    let num_frames = audio_buf_ref.frames();
    let num_channels = spec.channels.count();
    if num_channels == 0 || num_frames == 0 {
        return Some(0);
    }

    out.reserve(num_frames * num_channels * 2);

    macro_rules! interleave {
        ($buf:expr, $conversion_expr:expr) => {{
            let planes = $buf.planes();
            let channel_planes = planes.planes();
            if channel_planes.len() != num_channels {
                warn!(target: LOG_TARGET, "Plane count ({}) does not match channel count ({})", channel_planes.len(), num_channels);
                return None;
            }
            if channel_planes.iter().any(|plane| plane.len() < num_frames) {
                warn!(target: LOG_TARGET, "Plane shorter than buffer frame count ({})", num_frames);
                return None;
            }
            for frame in 0..num_frames {
                for plane in channel_planes.iter() {
                    let sample: i16 = $conversion_expr(plane[frame]);
                    out.extend_from_slice(&sample.to_le_bytes());
                }
            }
        }};
    }

    match audio_buf_ref {
        AudioBufferRef::U8(buf) => interleave!(buf, |s: u8| (s as i16 - 128) * 256),
        AudioBufferRef::S16(buf) => interleave!(buf, |s: i16| s),
        AudioBufferRef::S24(buf) => interleave!(buf, |s: symphonia::core::sample::i24| (s.0 >> 8) as i16),
        AudioBufferRef::S32(buf) => interleave!(buf, |s: i32| (s >> 16) as i16),
        AudioBufferRef::F32(buf) => interleave!(buf, |s: f32| (s * 32767.0).clamp(-32768.0, 32767.0) as i16),
        AudioBufferRef::F64(buf) => interleave!(buf, |s: f64| (s * 32767.0).clamp(-32768.0, 32767.0) as i16),
        _ => {
            warn!(target: LOG_TARGET, "Unsupported audio format for S16LE conversion: {:?}", spec);
            return None;
        }
    }
    Some(num_frames)
}
