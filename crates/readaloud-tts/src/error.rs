//! Error types for speech synthesis

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    /// Missing endpoint or credentials.
    #[error("configuration error: {0}")]
    Config(String),

    /// Blank or otherwise unusable input text.
    #[error("invalid text input: {0}")]
    InvalidInput(String),

    /// Transport-level failure. The display text carries the connection
    /// diagnostics shown to the user, see [`crate::client`].
    #[error("{0}")]
    Network(String),

    /// Non-2xx response from the endpoint.
    #[error("TTS API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type TtsResult<T> = Result<T, TtsError>;
