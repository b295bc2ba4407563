//! Narration engine client library for the pdf-narrate workspace
//!
//! Provides a unified interface for text-to-speech providers:
//! - Google Translate speech endpoint (keyless, short inputs)
//! - OpenAI-compatible `/audio/speech` APIs
//! - A mock narrator for tests

pub mod config;
pub mod error;
pub mod narrator;
pub mod providers;

pub use config::TtsConfig;
pub use error::{Result, TtsError};
pub use narrator::{AudioFormat, Narrator, SpeechAudio, SpeechRequest};
pub use providers::{MockNarrator, ProviderKind, get_narrator};
