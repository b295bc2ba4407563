//! Per-chunk narration state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tts_client::AudioFormat;

use crate::text::Chunk;

/// Where a chunk is in the narration process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Pending,
    Ready,
    Failed,
}

/// Audio produced for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    /// Ordinal of the chunk this audio narrates
    pub ordinal: usize,
    /// Human-readable label, e.g. "Part 2"
    pub label: String,
    pub audio: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioSegment {
    /// File name for this segment, e.g. "part_002.mp3".
    pub fn file_name(&self) -> String {
        format!("part_{:03}.{}", self.ordinal, self.format.extension())
    }
}

/// State of a single chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentState {
    pub ordinal: usize,
    pub label: String,
    pub status: SegmentStatus,
    /// Times narration was requested for this chunk
    pub attempts: u32,
    /// Error message if the last attempt failed
    pub error: Option<String>,
    /// Whether the audio came from the cache rather than the engine
    pub cached: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub audio: Option<AudioSegment>,
}

impl SegmentState {
    /// Create a new pending state for a chunk.
    pub fn new(chunk: &Chunk) -> Self {
        Self {
            ordinal: chunk.ordinal,
            label: chunk.label(),
            status: SegmentStatus::Pending,
            attempts: 0,
            error: None,
            cached: false,
            completed_at: None,
            audio: None,
        }
    }

    /// Mark this chunk as narrated.
    pub fn mark_ready(&mut self, audio: AudioSegment, cached: bool) {
        self.status = SegmentStatus::Ready;
        self.audio = Some(audio);
        self.cached = cached;
        self.error = None;
        self.completed_at = Some(Utc::now());
    }

    /// Mark this chunk as failed with the given error.
    pub fn mark_failed(&mut self, error: String) {
        self.status = SegmentStatus::Failed;
        self.error = Some(error);
        self.audio = None;
        self.completed_at = None;
    }

    pub fn is_pending(&self) -> bool {
        self.status == SegmentStatus::Pending
    }

    pub fn is_ready(&self) -> bool {
        self.status == SegmentStatus::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.status == SegmentStatus::Failed
    }
}

/// Counts of chunks by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub ready: usize,
    pub failed: usize,
    pub pending: usize,
}

impl Progress {
    pub fn total(&self) -> usize {
        self.ready + self.failed + self.pending
    }

    /// Percentage of chunks narrated.
    pub fn percent(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.ready as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(ordinal: usize) -> AudioSegment {
        AudioSegment {
            ordinal,
            label: format!("Part {}", ordinal),
            audio: vec![1, 2, 3],
            format: AudioFormat::Mp3,
        }
    }

    #[test]
    fn test_segment_state_new() {
        let state = SegmentState::new(&Chunk::new(2, "text".to_string()));
        assert_eq!(state.ordinal, 2);
        assert_eq!(state.label, "Part 2");
        assert!(state.is_pending());
        assert!(state.audio.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_mark_ready() {
        let mut state = SegmentState::new(&Chunk::new(1, "text".to_string()));
        state.mark_failed("quota".to_string());
        state.mark_ready(segment(1), false);
        assert!(state.is_ready());
        assert!(state.error.is_none());
        assert!(state.completed_at.is_some());
        assert_eq!(state.audio.as_ref().map(|a| a.audio.len()), Some(3));
    }

    #[test]
    fn test_mark_failed() {
        let mut state = SegmentState::new(&Chunk::new(1, "text".to_string()));
        state.mark_failed("Rate limit exceeded".to_string());
        assert!(state.is_failed());
        assert_eq!(state.error, Some("Rate limit exceeded".to_string()));
        assert!(state.audio.is_none());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(segment(7).file_name(), "part_007.mp3");
    }

    #[test]
    fn test_state_serializes_without_audio() {
        let mut state = SegmentState::new(&Chunk::new(1, "text".to_string()));
        state.mark_ready(segment(1), true);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["cached"], true);
        assert!(json.get("audio").is_none());
    }

    #[test]
    fn test_progress() {
        let progress = Progress {
            ready: 1,
            failed: 1,
            pending: 2,
        };
        assert_eq!(progress.total(), 4);
        assert!((progress.percent() - 25.0).abs() < 0.001);
        assert_eq!(Progress::default().percent(), 0.0);
    }
}
