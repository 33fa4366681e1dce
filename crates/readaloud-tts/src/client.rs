//! HTTP client for the speech endpoint

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{TtsError, TtsResult};
use crate::request::{is_official_endpoint, normalize_endpoint, SpeechRequest};
use crate::types::TtsConfig;
use crate::SpeechSynthesizer;

/// Client for OpenAI-compatible speech endpoints.
#[derive(Clone)]
pub struct TtsClient {
    http: reqwest::Client,
}

impl TtsClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for TtsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsClient {
    async fn synthesize(&self, text: &str, config: &TtsConfig) -> TtsResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("no text provided".into()));
        }
        if config.api_url.trim().is_empty() {
            return Err(TtsError::Config("API URL not configured".into()));
        }

        let endpoint = normalize_endpoint(&config.api_url);
        let body = SpeechRequest::build(text, config, &endpoint);
        debug!(
            %endpoint,
            official = is_official_endpoint(&endpoint),
            chars = text.len(),
            "requesting speech synthesis"
        );

        let mut request = self.http.post(&endpoint).json(&body);
        let key = config.api_key.trim();
        if !key.is_empty() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|_| TtsError::Network(connect_diagnostics(&endpoint, &config.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                status: status.as_u16(),
                message: api_error_message(&body, status),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Network(format!("failed to read audio response: {e}")))?;
        debug!(bytes = audio.len(), "received audio payload");
        Ok(audio.to_vec())
    }
}

/// Extract a human-readable message from a JSON error body, falling back to
/// the transport status text when the body is not JSON.
fn api_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Transport failures are indistinguishable from CORS rejections at this
/// layer, so the message enumerates the likely causes plus the port the user
/// should check. This text is a usability contract, not just an error code.
fn connect_diagnostics(endpoint: &str, api_url: &str) -> String {
    let port = reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.port_or_known_default())
        .unwrap_or(80);
    format!(
        "Failed to connect to API at {endpoint}. Possible issues: \
         1) CORS: the server must allow requests from the extension origin; \
         2) Network: check that {api_url} is reachable; \
         3) Firewall: ensure port {port} is open"
    )
}
