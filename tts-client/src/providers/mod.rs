//! Narration provider implementations

mod google_translate;
pub mod mock;
mod openai_compatible;

pub use google_translate::{GOOGLE_MAX_INPUT_CHARS, GoogleTranslateProvider};
pub use mock::{MOCK_MAX_INPUT_CHARS, MockNarrator};
pub use openai_compatible::{OPENAI_MAX_INPUT_CHARS, OpenAICompatibleProvider};

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::TtsConfig;
use crate::error::{Result, TtsError};
use crate::narrator::Narrator;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GoogleTranslate,
    OpenAI,
    Mock,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google-translate" | "google_translate" | "google" | "gtts" => {
                Ok(Self::GoogleTranslate)
            }
            "openai" | "openai-compatible" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::GoogleTranslate | Self::Mock => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
        }
    }

    /// Largest input per call, known without building the provider
    pub fn max_input_chars(&self) -> usize {
        match self {
            Self::GoogleTranslate => GOOGLE_MAX_INPUT_CHARS,
            Self::OpenAI => OPENAI_MAX_INPUT_CHARS,
            Self::Mock => MOCK_MAX_INPUT_CHARS,
        }
    }

    /// Display name used in error messages
    fn display_name(&self) -> &'static str {
        match self {
            Self::GoogleTranslate => "Google Translate",
            Self::OpenAI => "OpenAI",
            Self::Mock => "Mock",
        }
    }
}

/// Create a narrator from configuration
pub fn get_narrator(config: &TtsConfig) -> Result<Box<dyn Narrator>> {
    let kind = ProviderKind::from_str(&config.provider)?;

    match kind {
        ProviderKind::GoogleTranslate => Ok(Box::new(GoogleTranslateProvider::new(
            config.base_url.as_deref(),
        )?)),
        ProviderKind::OpenAI => {
            let api_key = get_api_key(config, kind)?;
            let model = config.model.as_deref().unwrap_or("tts-1");
            let provider = match config.base_url.as_deref() {
                Some(url) => OpenAICompatibleProvider::new(model, url, api_key, "OpenAI")?,
                None => OpenAICompatibleProvider::openai(model, api_key)?,
            };
            Ok(Box::new(provider))
        }
        ProviderKind::Mock => Ok(Box::new(MockNarrator::always_succeeds())),
    }
}

/// Get API key from config or the provider's environment variable
fn get_api_key(config: &TtsConfig, kind: ProviderKind) -> Result<String> {
    // Check config first
    if let Some(key) = config.api_key.clone() {
        return Ok(key);
    }

    let Some(env_var) = kind.env_var() else {
        return Err(TtsError::ConfigError(format!(
            "{} does not take an API key",
            kind.display_name()
        )));
    };

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        provider: kind.display_name().to_string(),
        env_var: env_var.to_string(),
    })
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Map a non-success HTTP status to an error.
fn status_error(status: u16, message: String, retry_after: Option<u64>) -> TtsError {
    match status {
        429 => TtsError::RateLimited { retry_after },
        // 503 is retried separately from other server errors
        503 => TtsError::ServerOverloaded { message },
        _ => TtsError::ApiError {
            message,
            status_code: Some(status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_provider_kind_aliases() {
        assert_eq!(
            ProviderKind::from_str("Google").unwrap(),
            ProviderKind::GoogleTranslate
        );
        assert_eq!(ProviderKind::from_str("gtts").unwrap(), ProviderKind::GoogleTranslate);
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAI);
        assert!(ProviderKind::from_str("coqui").is_err());
    }

    #[test]
    fn test_env_var() {
        assert_eq!(ProviderKind::OpenAI.env_var(), Some("OPENAI_API_KEY"));
        assert_eq!(ProviderKind::GoogleTranslate.env_var(), None);
    }

    #[test]
    fn test_max_input_chars_matches_built_narrator() {
        assert_eq!(
            ProviderKind::GoogleTranslate.max_input_chars(),
            get_narrator(&TtsConfig::default()).unwrap().max_input_chars()
        );
        let mock = TtsConfig {
            provider: "mock".to_string(),
            ..TtsConfig::default()
        };
        assert_eq!(
            ProviderKind::Mock.max_input_chars(),
            get_narrator(&mock).unwrap().max_input_chars()
        );
        // Known without an API key
        assert_eq!(ProviderKind::OpenAI.max_input_chars(), OPENAI_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_api_key_from_config_for_openai() {
        let config = TtsConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-config".to_string()),
            ..TtsConfig::default()
        };
        assert_eq!(
            get_api_key(&config, ProviderKind::OpenAI).unwrap(),
            "sk-config"
        );
        let keyless = TtsConfig::default();
        assert!(matches!(
            get_api_key(&keyless, ProviderKind::GoogleTranslate),
            Err(TtsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_get_narrator_google() {
        let narrator = get_narrator(&TtsConfig::default()).unwrap();
        assert_eq!(narrator.name(), "google-translate");
        assert_eq!(narrator.max_input_chars(), GOOGLE_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_get_narrator_openai_with_config_key() {
        let config = TtsConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..TtsConfig::default()
        };
        let narrator = get_narrator(&config).unwrap();
        assert_eq!(narrator.name(), "OpenAI");
        assert_eq!(narrator.max_input_chars(), OPENAI_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(429, String::new(), Some(5)),
            TtsError::RateLimited {
                retry_after: Some(5)
            }
        ));
        assert!(matches!(
            status_error(503, "busy".into(), None),
            TtsError::ServerOverloaded { .. }
        ));
        assert!(matches!(
            status_error(400, "bad".into(), None),
            TtsError::ApiError {
                status_code: Some(400),
                ..
            }
        ));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_secs(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after_secs(&headers), Some(12));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_secs(&headers), None);
    }
}
