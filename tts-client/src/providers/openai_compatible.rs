//! OpenAI-compatible speech provider
//!
//! Used for servers that implement the OpenAI `/audio/speech` endpoint:
//! - OpenAI
//! - Self-hosted compatible servers (set `base_url`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};
use crate::narrator::{AudioFormat, Narrator, SpeechAudio, SpeechRequest};

/// Input limit of the `/audio/speech` endpoint.
pub const OPENAI_MAX_INPUT_CHARS: usize = 4096;

/// Provider for OpenAI-compatible speech APIs
pub struct OpenAICompatibleProvider {
    model: String,
    base_url: String,
    api_key: String,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleProvider {
    /// Create a new OpenAI-compatible provider
    pub fn new(model: &str, base_url: &str, api_key: String, name: &'static str) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create a provider for the hosted OpenAI API
    pub fn openai(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://api.openai.com/v1", api_key, "OpenAI")
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct SpeechApiRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Narrator for OpenAICompatibleProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let body = SpeechApiRequest {
            model: &self.model,
            input: &request.text,
            voice: &request.voice,
            response_format: "mp3",
        };

        let url = format!("{}/audio/speech", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = super::retry_after_secs(response.headers());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(super::status_error(status.as_u16(), message, retry_after));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Network(format!("Failed to read audio: {}", e)))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn max_input_chars(&self) -> usize {
        OPENAI_MAX_INPUT_CHARS
    }

    fn is_available(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TtsError::ConfigError(format!(
                "{} API key is empty",
                self.name
            )));
        }
        Ok(())
    }
}
