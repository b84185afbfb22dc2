use crate::spdif::{CodecId, DecodedFrame};
use symphonia::core::audio::Channels;
use tracing::info;

const LOG_TARGET: &str = "spdif_bridge::audio::format_state";

/// Uncompressed input is always taken to be 16-bit stereo at 48 kHz. The
/// link carries no PCM format information, and guessing at other rates
/// would change which device the audio is routed to.
pub const RAW_PCM_CHANNELS: u16 = 2;
pub const RAW_PCM_SAMPLE_RATE: u32 = 48_000;

/// The format the output sink is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatState {
    pub codec: CodecId,
    pub channels: u16,
    pub sample_rate: u32,
    pub layout: Option<Channels>,
}

impl FormatState {
    pub const RAW_PCM: FormatState = FormatState {
        codec: CodecId::None,
        channels: RAW_PCM_CHANNELS,
        sample_rate: RAW_PCM_SAMPLE_RATE,
        layout: None,
    };

    pub fn from_decoded(frame: &DecodedFrame) -> Self {
        FormatState {
            codec: frame.codec,
            channels: frame.channels,
            sample_rate: frame.sample_rate,
            layout: frame.layout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChange {
    Unchanged,
    Changed {
        previous: Option<FormatState>,
        current: FormatState,
    },
}

impl FormatChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, FormatChange::Changed { .. })
    }
}

/// Holds the active output format for one session.
#[derive(Debug, Default)]
pub struct FormatTracker {
    active: Option<FormatState>,
}

impl FormatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<FormatState> {
        self.active
    }

    /// Makes `next` the active format. Reports a change when any field
    /// differs, or when nothing was active yet.
    pub fn observe(&mut self, next: FormatState) -> FormatChange {
        if self.active == Some(next) {
            return FormatChange::Unchanged;
        }
        let previous = self.active.replace(next);
        if next.codec.is_none() {
            info!(target: LOG_TARGET, "Detected S/PDIF uncompressed audio");
        } else {
            info!(
                target: LOG_TARGET,
                "Detected S/PDIF codec {} ({} ch, {} Hz)",
                next.codec, next.channels, next.sample_rate
            );
        }
        FormatChange::Changed { previous, current: next }
    }
}
