//! Error types for audio playback

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No usable output device or stream.
    #[error("audio output unavailable: {0}")]
    Device(String),

    /// The audio bytes could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// The session died after it started.
    #[error("playback failed: {0}")]
    Failed(String),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
