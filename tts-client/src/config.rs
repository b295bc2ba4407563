use serde::{Deserialize, Serialize};

/// Narration engine configuration, embedded in the application config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Provider identifier (google-translate, openai, mock)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Voice or locale passed with every request ("en", "alloy", ...)
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Model name, for providers that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_provider() -> String {
    "google-translate".to_string()
}

fn default_voice() -> String {
    "en".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            voice: default_voice(),
            model: None,
            base_url: None,
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default)]
        tts: TtsConfig,
    }

    #[test]
    fn test_default_config() {
        let config = TtsConfig::default();
        assert_eq!(config.provider, "google-translate");
        assert_eq!(config.voice, "en");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let parsed: Wrapper = serde_json::from_str(r#"{"tts": {"voice": "fr"}}"#).unwrap();
        assert_eq!(parsed.tts.provider, "google-translate");
        assert_eq!(parsed.tts.voice, "fr");

        let parsed: Wrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.tts, TtsConfig::default());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_value(TtsConfig::default()).unwrap();
        assert!(json.get("api_key").is_none());
        assert!(json.get("base_url").is_none());
    }
}
