//! pdf-narrate configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tts_client::TtsConfig;

use crate::error::PipelineError;
use crate::narration::DEFAULT_MAX_RETRIES;
use crate::pipeline::CleaningProfile;
use crate::text::filter::{MAIN_SECTION_HEADERS, TRAILING_SECTION_MARKERS};
use crate::text::{ChunkSpec, ChunkUnit, FilterLevel, Substitution};

const DEFAULT_CHUNK_SIZE: usize = 200;
const DEFAULT_SUMMARY_SENTENCES: usize = 5;

/// Headings that drive the reference filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionsConfig {
    /// Headings that start back matter to drop (references, bibliography, ...)
    #[serde(default = "default_trailing")]
    pub trailing: Vec<String>,

    /// Headings that start the main body (abstract, introduction, ...)
    #[serde(default = "default_main")]
    pub main: Vec<String>,
}

fn default_trailing() -> Vec<String> {
    TRAILING_SECTION_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_main() -> Vec<String> {
    MAIN_SECTION_HEADERS.iter().map(|s| s.to_string()).collect()
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            trailing: default_trailing(),
            main: default_main(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfNarrateConfig {
    /// How much of the document to keep
    #[serde(default)]
    pub filter: FilterLevel,

    /// Unit for chunk_size (characters or words)
    #[serde(default)]
    pub chunk_unit: ChunkUnit,

    /// Maximum chunk size in chunk_unit
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Sentences shown by --summary when no count is given
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,

    /// Retries for transient narration failures, per chunk
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Directory for cached audio. None means the user cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Extra spoken-form substitutions, applied after the built-in table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitutions: Vec<Substitution>,

    #[serde(default)]
    pub sections: SectionsConfig,

    #[serde(default)]
    pub tts: TtsConfig,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_summary_sentences() -> usize {
    DEFAULT_SUMMARY_SENTENCES
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for PdfNarrateConfig {
    fn default() -> Self {
        Self {
            filter: FilterLevel::default(),
            chunk_unit: ChunkUnit::default(),
            chunk_size: default_chunk_size(),
            summary_sentences: default_summary_sentences(),
            max_retries: default_max_retries(),
            cache_dir: None,
            substitutions: Vec::new(),
            sections: SectionsConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl PdfNarrateConfig {
    /// Get the config file path: ~/.config/pdf-narrate/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("pdf-narrate")
            .join("config.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PdfNarrateConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Check every setting that would otherwise fail mid-run.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.chunk_spec()?;
        if self.summary_sentences == 0 {
            return Err(PipelineError::config(
                "summary_sentences must be at least 1",
            ));
        }
        self.cleaning_profile()?;
        Ok(())
    }

    pub fn chunk_spec(&self) -> Result<ChunkSpec, PipelineError> {
        ChunkSpec::new(self.chunk_unit, self.chunk_size)
    }

    /// Compile the substitution table and section markers.
    pub fn cleaning_profile(&self) -> Result<CleaningProfile, PipelineError> {
        CleaningProfile::new(
            self.substitutions.clone(),
            &self.sections.trailing,
            &self.sections.main,
        )
    }
}
