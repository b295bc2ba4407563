use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TtsError};

/// Base delay between retries of a transient failure.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound for a server-provided retry hint.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Request to narrate a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// Voice or locale identifier, interpreted by the provider
    pub voice: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// Audio container returned by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Guess the container from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

/// Audio produced by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Trait for narration engines
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Synthesize one request into audio
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Largest input, in characters, the engine accepts per call
    fn max_input_chars(&self) -> usize;

    /// Check if the provider is usable (API key set, endpoint configured, etc.)
    fn is_available(&self) -> Result<()>;

    /// Synthesize, retrying transient failures up to `max_retries` extra times.
    ///
    /// Non-transient errors are returned immediately.
    async fn synthesize_with_retry(
        &self,
        request: &SpeechRequest,
        max_retries: u32,
    ) -> Result<SpeechAudio> {
        let mut attempt = 0;
        loop {
            match self.synthesize(request).await {
                Ok(audio) => return Ok(audio),
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        self.name(),
                        attempt,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before the given retry attempt (1-based).
fn retry_delay(error: &TtsError, attempt: u32) -> Duration {
    if let TtsError::RateLimited {
        retry_after: Some(secs),
    } = error
    {
        return Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS));
    }
    Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt.saturating_sub(1).min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_extension() {
        assert_eq!(AudioFormat::Mp3.extension(), "mp3");
        assert_eq!(AudioFormat::from_extension("WAV"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_extension("ogg"), None);
    }

    #[test]
    fn test_retry_delay_backoff() {
        let err = TtsError::Network("reset".into());
        assert_eq!(retry_delay(&err, 1), Duration::from_millis(500));
        assert_eq!(retry_delay(&err, 2), Duration::from_millis(1000));
        assert_eq!(retry_delay(&err, 3), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_delay_honors_hint() {
        let err = TtsError::RateLimited {
            retry_after: Some(7),
        };
        assert_eq!(retry_delay(&err, 1), Duration::from_secs(7));
        let err = TtsError::RateLimited {
            retry_after: Some(3600),
        };
        assert_eq!(retry_delay(&err, 1), Duration::from_secs(60));
    }
}
