//! Keyless Google Translate speech endpoint.
//!
//! Returns MP3 and only accepts short inputs, so callers must chunk text
//! below [`GOOGLE_MAX_INPUT_CHARS`] first.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Result, TtsError};
use crate::narrator::{AudioFormat, Narrator, SpeechAudio, SpeechRequest};

/// Longest input the endpoint narrates in full.
pub const GOOGLE_MAX_INPUT_CHARS: usize = 200;

const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// Narrator backed by the `translate_tts` endpoint
pub struct GoogleTranslateProvider {
    base_url: String,
    client: Client,
}

impl GoogleTranslateProvider {
    /// Create a provider, optionally pointing at a different host
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; pdf-narrate)")
            .build()
            .map_err(|e| TtsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }

    fn query<'a>(request: &'a SpeechRequest, text_len: &'a str) -> [(&'static str, &'a str); 7] {
        [
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", request.voice.as_str()),
            ("q", request.text.as_str()),
            ("total", "1"),
            ("idx", "0"),
            ("textlen", text_len),
        ]
    }
}

#[async_trait]
impl Narrator for GoogleTranslateProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let text_len = request.text.chars().count().to_string();
        let url = format!("{}/translate_tts", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&Self::query(request, &text_len))
            .send()
            .await
            .map_err(|e| TtsError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = super::retry_after_secs(response.headers());
            let message = response.text().await.unwrap_or_default();
            return Err(super::status_error(status.as_u16(), message, retry_after));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Network(format!("Failed to read audio: {}", e)))?;

        if bytes.is_empty() {
            return Err(TtsError::ApiError {
                message: "Empty audio response".to_string(),
                status_code: Some(status.as_u16()),
            });
        }

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &'static str {
        "google-translate"
    }

    fn max_input_chars(&self) -> usize {
        GOOGLE_MAX_INPUT_CHARS
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let provider = GoogleTranslateProvider::new(None).unwrap();
        assert_eq!(provider.base_url, "https://translate.google.com");
    }

    #[test]
    fn test_query_uses_voice_as_language() {
        let request = SpeechRequest::new("Hello world", "en-GB");
        let query = GoogleTranslateProvider::query(&request, "11");
        assert!(query.contains(&("tl", "en-GB")));
        assert!(query.contains(&("q", "Hello world")));
        assert!(query.contains(&("textlen", "11")));
    }
}
