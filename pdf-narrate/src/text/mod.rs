//! Text processing for narration: normalization, filtering, chunking and
//! sentence summaries.

pub mod chunker;
pub mod filter;
pub mod normalizer;
pub mod sentences;

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub use chunker::chunk;
pub use filter::{FilterLevel, ReferenceFilter};
pub use normalizer::{Substitution, normalize_with};
pub use sentences::summarize;

/// Unit in which chunk size is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    #[default]
    Characters,
    Words,
}

impl fmt::Display for ChunkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Characters => f.write_str("characters"),
            Self::Words => f.write_str("words"),
        }
    }
}

impl FromStr for ChunkUnit {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "characters" | "chars" | "c" => Ok(Self::Characters),
            "words" | "w" => Ok(Self::Words),
            _ => Err(PipelineError::config(format!(
                "unknown chunk unit '{}' (expected characters or words)",
                s
            ))),
        }
    }
}

/// A validated chunking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSpec {
    pub unit: ChunkUnit,
    pub size: NonZeroUsize,
}

impl ChunkSpec {
    /// Rejects a zero size up front, before any text is processed.
    pub fn new(unit: ChunkUnit, size: usize) -> Result<Self, PipelineError> {
        let size = NonZeroUsize::new(size)
            .ok_or_else(|| PipelineError::config("chunk size must be a positive integer"))?;
        Ok(Self { unit, size })
    }

    /// Make sure character chunks fit the narrator's per-call limit.
    ///
    /// Word chunks have no fixed character length and are checked one by one
    /// when narrated.
    pub fn check_bound(&self, max_chars: usize) -> Result<(), PipelineError> {
        if self.unit == ChunkUnit::Characters && self.size.get() > max_chars {
            return Err(PipelineError::config(format!(
                "chunk size {} exceeds the narrator limit of {} characters",
                self.size, max_chars
            )));
        }
        Ok(())
    }
}

/// A piece of cleaned text ready for narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position in the document
    pub ordinal: usize,
    /// The text content
    pub text: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(ordinal: usize, text: String) -> Self {
        Self { ordinal, text }
    }

    /// Human-readable label, e.g. "Part 3".
    pub fn label(&self) -> String {
        format!("Part {}", self.ordinal)
    }
}
