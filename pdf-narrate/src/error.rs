//! Error types for the cleaning pipeline.

use thiserror::Error;

/// Why no text could be taken from a source document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no text available: document is empty")]
    Empty,

    #[error("no text available: document could not be parsed ({0})")]
    Malformed(String),

    #[error("no text available: document is encrypted")]
    Encrypted,

    #[error("no text available: {pages} page(s) contain no extractable text (scanned or image-only?)")]
    NoText { pages: usize },
}

/// Errors that halt a pipeline run before any audio is requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
