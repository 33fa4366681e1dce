//! Coordinator-level error taxonomy

use readaloud_tts::TtsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Nothing to speak: no text supplied and the page selection was blank.
    #[error("no text to read")]
    EmptyInput,

    /// Synthesis failed (config, network, or API error).
    #[error(transparent)]
    Tts(#[from] TtsError),

    /// Neither the primary nor the fallback playback target was reachable.
    #[error("no reachable playback target: {0}")]
    Routing(String),

    /// The playback target rejected or failed the audio session.
    #[error("playback failed: {0}")]
    Playback(String),
}
