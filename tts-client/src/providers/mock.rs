//! Mock narrator for testing
//!
//! Provides a configurable narrator that can simulate quota failures,
//! retries, per-text failures and successful synthesis.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TtsError};
use crate::narrator::{AudioFormat, Narrator, SpeechAudio, SpeechRequest};

/// Default input bound of the mock narrator
pub const MOCK_MAX_INPUT_CHARS: usize = 4096;

/// A mock narrator for testing retry and per-chunk failure behavior
pub struct MockNarrator {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<TtsError>>,
    /// Texts that always fail with `fail_with` (or a rate limit)
    failing_texts: Mutex<HashSet<String>>,
    /// Every request received, in order
    requests: Mutex<Vec<SpeechRequest>>,
    /// Input bound reported by `max_input_chars`
    max_input_chars: usize,
}

impl MockNarrator {
    fn build(fail_count: usize, fail_with: Option<TtsError>) -> Self {
        Self {
            fail_count: AtomicUsize::new(fail_count),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(fail_with),
            failing_texts: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
            max_input_chars: MOCK_MAX_INPUT_CHARS,
        }
    }

    /// Create a narrator that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError) -> Self {
        Self::build(n, Some(error))
    }

    /// Create a narrator that always fails with the given error
    pub fn always_fails(error: TtsError) -> Self {
        Self::build(usize::MAX, Some(error))
    }

    /// Create a narrator that always succeeds
    pub fn always_succeeds() -> Self {
        Self::build(0, None)
    }

    /// Make every request for `text` fail, regardless of call count
    pub fn failing_on(self, text: &str) -> Self {
        self.failing_texts
            .lock()
            .unwrap()
            .insert(text.to_string());
        self
    }

    /// Stop failing for `text` (simulates a quota window passing)
    pub fn recover(&self, text: &str) {
        self.failing_texts.lock().unwrap().remove(text);
    }

    /// Set the input bound
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn requested_texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    fn failure(&self) -> TtsError {
        let error = self.fail_with.lock().unwrap();
        match error.as_ref() {
            Some(err) => clone_error(err),
            None => TtsError::RateLimited { retry_after: None },
        }
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.failing_texts.lock().unwrap().contains(&request.text) {
            return Err(self.failure());
        }

        if call_num < self.fail_count.load(Ordering::SeqCst)
            && self.fail_with.lock().unwrap().is_some()
        {
            return Err(self.failure());
        }

        // Deterministic payload so callers can check which text produced it
        let mut bytes = b"MOCK:".to_vec();
        bytes.extend_from_slice(request.voice.as_bytes());
        bytes.push(b':');
        bytes.extend_from_slice(request.text.as_bytes());

        Ok(SpeechAudio {
            bytes,
            format: AudioFormat::Wav,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a TtsError (needed because TtsError doesn't implement Clone)
fn clone_error(err: &TtsError) -> TtsError {
    match err {
        TtsError::MissingApiKey { provider, env_var } => TtsError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        TtsError::EmptyText => TtsError::EmptyText,
        TtsError::TextTooLong { provider, len, max } => TtsError::TextTooLong {
            provider: provider.clone(),
            len: *len,
            max: *max,
        },
        TtsError::RateLimited { retry_after } => TtsError::RateLimited {
            retry_after: *retry_after,
        },
        TtsError::ServerOverloaded { message } => TtsError::ServerOverloaded {
            message: message.clone(),
        },
        TtsError::Network(s) => TtsError::Network(s.clone()),
        TtsError::ApiError {
            message,
            status_code,
        } => TtsError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        TtsError::ConfigError(s) => TtsError::ConfigError(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest::new(text, "en")
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let narrator = MockNarrator::always_succeeds();
        let audio = narrator.synthesize(&request("hello")).await.unwrap();
        assert_eq!(audio.bytes, b"MOCK:en:hello".to_vec());
        assert_eq!(audio.format, AudioFormat::Wav);
        assert_eq!(narrator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let narrator = MockNarrator::always_fails(TtsError::ServerOverloaded {
            message: "overloaded".to_string(),
        });
        for _ in 0..3 {
            assert!(narrator.synthesize(&request("hello")).await.is_err());
        }
        assert_eq!(narrator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let narrator =
            MockNarrator::fails_then_succeeds(2, TtsError::RateLimited { retry_after: None });

        assert!(narrator.synthesize(&request("a")).await.is_err());
        assert!(narrator.synthesize(&request("a")).await.is_err());
        assert!(narrator.synthesize(&request("a")).await.is_ok());
        assert_eq!(narrator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_on_specific_text() {
        let narrator = MockNarrator::always_succeeds().failing_on("bad");
        assert!(narrator.synthesize(&request("good")).await.is_ok());
        assert!(matches!(
            narrator.synthesize(&request("bad")).await,
            Err(TtsError::RateLimited { .. })
        ));

        narrator.recover("bad");
        assert!(narrator.synthesize(&request("bad")).await.is_ok());
        assert_eq!(narrator.requested_texts(), vec!["good", "bad", "bad"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_errors() {
        let narrator = MockNarrator::fails_then_succeeds(2, TtsError::Network("reset".into()));
        let audio = narrator.synthesize_with_retry(&request("hi"), 3).await;
        assert!(audio.is_ok());
        assert_eq!(narrator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_limit() {
        let narrator = MockNarrator::always_fails(TtsError::Network("reset".into()));
        let result = narrator.synthesize_with_retry(&request("hi"), 2).await;
        assert!(matches!(result, Err(TtsError::Network(_))));
        assert_eq!(narrator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_errors() {
        let narrator = MockNarrator::always_fails(TtsError::ApiError {
            message: "unknown voice".into(),
            status_code: Some(400),
        });
        let result = narrator.synthesize_with_retry(&request("hi"), 5).await;
        assert!(result.is_err());
        assert_eq!(narrator.call_count(), 1);
    }
}
