use crate::audio::backend::Backend;
use crate::audio::error::AudioError;
use crate::audio::format_state::{RAW_PCM_CHANNELS, RAW_PCM_SAMPLE_RATE};
use crate::audio::output::SinkParams;
use std::f32::consts::PI;
use tracing::info;

const LOG_TARGET: &str = "spdif_bridge::audio::tone";

pub const TEST_TONE_HZ: f32 = 440.0;
pub const TEST_TONE_SECONDS: u32 = 2;
const TEST_TONE_AMPLITUDE: f32 = 0.25;
const CHUNK_FRAMES: usize = 4800;

/// Interleaved S16LE stereo sine starting at frame `start`.
pub fn sine_frames(freq: f32, sample_rate: u32, start: usize, frames: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(frames * RAW_PCM_CHANNELS as usize * 2);
    for n in start..start + frames {
        let phase = 2.0 * PI * freq * n as f32 / sample_rate as f32;
        let sample = (phase.sin() * TEST_TONE_AMPLITUDE * i16::MAX as f32) as i16;
        for _ in 0..RAW_PCM_CHANNELS {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }
    out
}

/// Plays the test tone on `device` through the backend's output driver.
pub fn run_self_test<B: Backend + ?Sized>(backend: &mut B, device: &str) -> Result<(), AudioError> {
    info!(target: LOG_TARGET, "Playing {} Hz test tone on '{}'", TEST_TONE_HZ, device);
    let mut sink = backend.open_sink(device, SinkParams::pcm(RAW_PCM_CHANNELS, RAW_PCM_SAMPLE_RATE))?;
    let total = (RAW_PCM_SAMPLE_RATE * TEST_TONE_SECONDS) as usize;
    let mut written = 0;
    while written < total {
        let frames = CHUNK_FRAMES.min(total - written);
        sink.write(&sine_frames(TEST_TONE_HZ, RAW_PCM_SAMPLE_RATE, written, frames))?;
        written += frames;
    }
    info!(target: LOG_TARGET, "Test tone finished");
    Ok(())
}
