// src/error.rs

use thiserror::Error;

/// The audio device service could not open an output stream.
///
/// This is the only failure the generator reports. Nothing is registered
/// with the device when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceInitError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to get default output config: {0}")]
    DefaultConfig(String),

    #[error("failed to build audio stream: {0}")]
    BuildStream(String),

    #[error("failed to play audio stream: {0}")]
    PlayStream(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("device already has a render callback registered")]
    AlreadyOpen,

    #[error("invalid output channel count: {0}")]
    InvalidChannelCount(u16),
}
