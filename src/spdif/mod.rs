//! S/PDIF container parsing and decoding

pub mod codec;
pub mod decoder;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_decoder;
mod format_converter;
pub mod iec61937;
pub mod probe;

pub use codec::CodecId;
pub use probe::{CodecProbe, DecodedFrame, ProbeOutcome, SpdifProbe};
