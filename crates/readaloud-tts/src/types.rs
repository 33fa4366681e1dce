//! TTS configuration

use serde::{Deserialize, Serialize};

/// Default model sent to the official API. Compatible/local servers do not
/// accept a model field, so this value also marks "not overridden".
pub const DEFAULT_MODEL: &str = "tts-1";

/// User-configurable synthesis parameters.
///
/// Loaded once at startup merged over these defaults (missing keys fall back
/// field-by-field, no partial validation) and mutated only via an explicit
/// save. The background context holds it for its lifetime and reloads it if
/// the host tears that context down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base endpoint URL, e.g. `http://localhost:8880/v1`.
    pub api_url: String,
    /// Bearer token; blank means the server requires no auth.
    pub api_key: String,
    pub model: String,
    pub voice: String,
    /// Playback speed multiplier. Compatible servers only accept integer
    /// multiples, see [`crate::request::SpeechRequest`].
    pub speed: f32,
    /// Playback volume in [0, 1], applied by the audio engine.
    pub volume: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8880/v1".to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            volume: 1.0,
        }
    }
}
