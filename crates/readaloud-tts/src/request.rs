//! Endpoint normalization and request body shaping

use serde::Serialize;

use crate::types::{TtsConfig, DEFAULT_MODEL};

/// Fixed speech-synthesis path segment appended to the configured base URL.
pub const SPEECH_PATH: &str = "/audio/speech";

/// Hostname that identifies the official vendor API; everything else is
/// treated as a local/compatible server.
pub const OFFICIAL_API_HOST: &str = "api.openai.com";

/// Normalize a configured base URL into the full speech endpoint.
///
/// Idempotent: trims whitespace, strips one trailing slash, and appends
/// [`SPEECH_PATH`] unless already present.
pub fn normalize_endpoint(api_url: &str) -> String {
    let mut endpoint = api_url.trim().to_string();
    if let Some(stripped) = endpoint.strip_suffix('/') {
        endpoint.truncate(stripped.len());
    }
    if !endpoint.ends_with(SPEECH_PATH) {
        endpoint.push_str(SPEECH_PATH);
    }
    endpoint
}

pub fn is_official_endpoint(endpoint: &str) -> bool {
    endpoint.contains(OFFICIAL_API_HOST)
}

/// Request body, shaped per endpoint flavor.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SpeechRequest<'a> {
    Official {
        model: &'a str,
        voice: &'a str,
        input: &'a str,
        speed: f32,
        response_format: &'a str,
    },
    /// Local/compatible servers (Kokoro and friends): no `model` unless
    /// explicitly overridden, integer speed only, streaming/format hints.
    Compatible {
        input: &'a str,
        voice: &'a str,
        response_format: &'a str,
        download_format: &'a str,
        stream: bool,
        speed: u32,
        return_download_link: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<&'a str>,
    },
}

impl<'a> SpeechRequest<'a> {
    pub fn build(text: &'a str, config: &'a TtsConfig, endpoint: &str) -> Self {
        if is_official_endpoint(endpoint) {
            SpeechRequest::Official {
                model: &config.model,
                voice: &config.voice,
                input: text,
                speed: config.speed,
                response_format: "mp3",
            }
        } else {
            SpeechRequest::Compatible {
                input: text,
                voice: &config.voice,
                response_format: "mp3",
                download_format: "mp3",
                stream: true,
                speed: compatible_speed(config.speed),
                return_download_link: true,
                model: overridden_model(config),
            }
        }
    }
}

/// Compatible servers historically accept only integer speed multiples, so
/// fractional speeds are rounded away here, with 0 bumped to 1.
fn compatible_speed(speed: f32) -> u32 {
    let rounded = speed.round();
    if rounded < 1.0 {
        1
    } else {
        rounded as u32
    }
}

fn overridden_model(config: &TtsConfig) -> Option<&str> {
    let model = config.model.trim();
    if model.is_empty() || model == DEFAULT_MODEL {
        None
    } else {
        Some(model)
    }
}
