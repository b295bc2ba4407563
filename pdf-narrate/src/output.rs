//! Writing narrated parts and the run manifest to an output directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::narration::{NarrationSession, Progress, SegmentState};
use crate::text::{ChunkUnit, FilterLevel};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Record of one narration run, saved next to the audio files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub document_id: String,
    pub filter: FilterLevel,
    pub chunk_unit: ChunkUnit,
    pub chunk_size: usize,
    pub provider: String,
    pub voice: String,
    pub created_at: DateTime<Utc>,
    pub ready: usize,
    pub failed: usize,
    pub pending: usize,
    pub segments: Vec<SegmentState>,
}

/// Settings of a run, filled in before narration starts.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub source: String,
    pub document_id: String,
    pub filter: FilterLevel,
    pub chunk_unit: ChunkUnit,
    pub chunk_size: usize,
    pub provider: String,
    pub voice: String,
}

impl Manifest {
    pub fn new(info: RunInfo, session: &NarrationSession) -> Self {
        let Progress {
            ready,
            failed,
            pending,
        } = session.progress();

        Self {
            source: info.source,
            document_id: info.document_id,
            filter: info.filter,
            chunk_unit: info.chunk_unit,
            chunk_size: info.chunk_size,
            provider: info.provider,
            voice: info.voice,
            created_at: Utc::now(),
            ready,
            failed,
            pending,
            segments: session.states().to_vec(),
        }
    }

    /// Load a manifest written by a previous run.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let file = File::open(&path)
            .with_context(|| format!("Failed to open manifest {}", path.display()))?;
        let manifest = serde_json::from_reader(file).context("Failed to parse manifest JSON")?;
        Ok(manifest)
    }
}

/// Default output directory: "<pdf stem>_audio" next to the PDF.
pub fn default_output_dir(pdf_path: &Path) -> PathBuf {
    let stem = pdf_path.file_stem().unwrap_or_default();
    pdf_path.with_file_name(format!("{}_audio", stem.to_string_lossy()))
}

/// Write every ready segment and the manifest. Returns the audio files written.
pub fn write_outputs(
    dir: &Path,
    session: &NarrationSession,
    manifest: &Manifest,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for segment in session.ready_segments() {
        let path = dir.join(segment.file_name());
        fs::write(&path, &segment.audio)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    let file = File::create(&manifest_path).context("Failed to create manifest file")?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, manifest).context("Failed to write manifest JSON")?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::{AudioCache, Dispatcher, SegmentStatus};
    use crate::text::Chunk;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tts_client::{MockNarrator, Narrator};

    fn info() -> RunInfo {
        RunInfo {
            source: "paper.pdf".to_string(),
            document_id: "0123456789abcdef".to_string(),
            filter: FilterLevel::SkipReferences,
            chunk_unit: ChunkUnit::Characters,
            chunk_size: 200,
            provider: "mock".to_string(),
            voice: "en".to_string(),
        }
    }

    async fn narrated_session() -> NarrationSession {
        let narrator: Arc<dyn Narrator> =
            Arc::new(MockNarrator::always_succeeds().failing_on("bad"));
        let mut dispatcher =
            Dispatcher::new(narrator, "en", AudioCache::in_memory()).with_max_retries(0);
        let mut session = NarrationSession::new(vec![
            Chunk::new(1, "good".to_string()),
            Chunk::new(2, "bad".to_string()),
            Chunk::new(3, "fine".to_string()),
        ]);
        session.generate_many([1, 2], &mut dispatcher, |_| {}).await;
        session
    }

    #[test]
    fn test_default_output_dir() {
        let dir = default_output_dir(Path::new("/papers/flood-model.pdf"));
        assert_eq!(dir, PathBuf::from("/papers/flood-model_audio"));
    }

    #[tokio::test]
    async fn test_write_outputs() {
        let session = narrated_session().await;
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");
        let manifest = Manifest::new(info(), &session);

        let written = write_outputs(&out, &session, &manifest).unwrap();

        assert_eq!(written, vec![out.join("part_001.wav")]);
        assert_eq!(fs::read(&written[0]).unwrap(), b"MOCK:en:good");
        assert!(!out.join("part_002.wav").exists());

        let loaded = Manifest::load(&out).unwrap();
        assert_eq!(loaded.document_id, "0123456789abcdef");
        assert_eq!(loaded.filter, FilterLevel::SkipReferences);
        assert_eq!((loaded.ready, loaded.failed, loaded.pending), (1, 1, 1));
        assert_eq!(loaded.segments.len(), 3);
        assert_eq!(loaded.segments[1].status, SegmentStatus::Failed);
        assert!(loaded.segments[1].error.is_some());
        assert_eq!(loaded.segments[2].status, SegmentStatus::Pending);
        assert!(loaded.segments.iter().all(|s| s.audio.is_none()));
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Manifest::load(temp_dir.path()).is_err());
    }
}
