//! Speech synthesis client for OpenAI-compatible TTS endpoints
//!
//! Builds and issues the speech request against either the official vendor
//! API or a local/compatible server (Kokoro and friends), returning the raw
//! audio bytes. Stateless given its inputs; configuration is read, never
//! mutated.

use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod request;
pub mod types;

pub use client::TtsClient;
pub use error::{TtsError, TtsResult};
pub use request::{is_official_endpoint, normalize_endpoint, SpeechRequest};
pub use types::TtsConfig;

/// Seam between the coordinator and the concrete HTTP client, so playback
/// flows can be exercised without a network.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into audio bytes (mp3 by default).
    async fn synthesize(&self, text: &str, config: &TtsConfig) -> TtsResult<Vec<u8>>;
}
