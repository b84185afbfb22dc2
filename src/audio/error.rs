use std::io;
use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Errors raised anywhere in the capture → probe → sink pipeline.
///
/// None of these are retried where they are raised; they travel up to the
/// supervisor, which tears the whole session down and starts over.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("ALSA error: {0}")]
    AlsaError(String),
    #[error("Capture error: {0}")]
    CaptureError(String),
    #[error("Decoding error: {0}")]
    DecodingError(String),
    #[error("No decoder available for {0}")]
    UnsupportedCodec(&'static str),
    #[error("Sink error: {0}")]
    SinkError(String),
    #[error("Symphonia error: {0}")]
    SymphoniaError(#[from] SymphoniaError),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl From<alsa::Error> for AudioError {
    fn from(e: alsa::Error) -> Self {
        AudioError::AlsaError(e.to_string())
    }
}
