//! Narration dispatch: turns chunks into audio one at a time, on demand.
//!
//! A failed chunk is recorded on its own state and never stops the others;
//! failed chunks can be retried without touching the ones already narrated.

pub mod cache;
mod types;

pub use cache::{AudioCache, cache_key, default_cache_dir};
pub use types::{AudioSegment, Progress, SegmentState, SegmentStatus};

use std::sync::Arc;

use tts_client::{Narrator, SpeechRequest, TtsError};

use crate::text::Chunk;

/// Default number of extra attempts for transient engine failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Audio for a chunk, and whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Narrated {
    pub segment: AudioSegment,
    pub cached: bool,
}

/// Sends chunks to a narrator, enforcing its input bound and memoizing audio.
pub struct Dispatcher {
    narrator: Arc<dyn Narrator>,
    voice: String,
    cache: AudioCache,
    max_retries: u32,
}

impl Dispatcher {
    pub fn new(narrator: Arc<dyn Narrator>, voice: impl Into<String>, cache: AudioCache) -> Self {
        Self {
            narrator,
            voice: voice.into(),
            cache,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set how many times a transient failure is retried per request.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    /// Narrate one chunk.
    ///
    /// Empty or over-long text is rejected without calling the engine.
    pub async fn narrate(&mut self, chunk: &Chunk) -> Result<Narrated, TtsError> {
        if chunk.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let len = chunk.text.chars().count();
        let max = self.narrator.max_input_chars();
        if len > max {
            return Err(TtsError::TextTooLong {
                provider: self.narrator.name().to_string(),
                len,
                max,
            });
        }

        let key = cache_key(self.narrator.name(), &self.voice, &chunk.text);
        let (audio, cached) = match self.cache.get(&key) {
            Some(audio) => {
                log::debug!("{}: audio cache hit", chunk.label());
                (audio, true)
            }
            None => {
                let request = SpeechRequest::new(chunk.text.clone(), self.voice.clone());
                let audio = self
                    .narrator
                    .synthesize_with_retry(&request, self.max_retries)
                    .await?;
                self.cache.insert(&key, audio.clone());
                (audio, false)
            }
        };

        Ok(Narrated {
            segment: AudioSegment {
                ordinal: chunk.ordinal,
                label: chunk.label(),
                audio: audio.bytes,
                format: audio.format,
            },
            cached,
        })
    }
}

/// Chunks of one document and the narration state of each.
#[derive(Debug, Clone)]
pub struct NarrationSession {
    chunks: Vec<Chunk>,
    states: Vec<SegmentState>,
}

impl NarrationSession {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let states = chunks.iter().map(SegmentState::new).collect();
        Self { chunks, states }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn states(&self) -> &[SegmentState] {
        &self.states
    }

    fn index_of(&self, ordinal: usize) -> Option<usize> {
        self.chunks.iter().position(|c| c.ordinal == ordinal)
    }

    pub fn state(&self, ordinal: usize) -> Option<&SegmentState> {
        self.index_of(ordinal).map(|i| &self.states[i])
    }

    /// Get progress as counts of ready, failed and pending chunks.
    pub fn progress(&self) -> Progress {
        self.states
            .iter()
            .fold(Progress::default(), |mut p, s| {
                match s.status {
                    SegmentStatus::Ready => p.ready += 1,
                    SegmentStatus::Failed => p.failed += 1,
                    SegmentStatus::Pending => p.pending += 1,
                }
                p
            })
    }

    /// Ordinal of the first chunk not yet attempted.
    pub fn next_pending(&self) -> Option<usize> {
        self.states.iter().find(|s| s.is_pending()).map(|s| s.ordinal)
    }

    /// Ordinals of chunks whose last attempt failed.
    pub fn failed_ordinals(&self) -> Vec<usize> {
        self.states
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.ordinal)
            .collect()
    }

    /// Narrated segments, in document order.
    pub fn ready_segments(&self) -> impl Iterator<Item = &AudioSegment> {
        self.states.iter().filter_map(|s| s.audio.as_ref())
    }

    /// Narrate one chunk unless it is already ready.
    ///
    /// Returns `None` for an unknown ordinal.
    pub async fn generate(
        &mut self,
        ordinal: usize,
        dispatcher: &mut Dispatcher,
    ) -> Option<&SegmentState> {
        let index = self.index_of(ordinal)?;
        if self.states[index].is_ready() {
            return Some(&self.states[index]);
        }

        let chunk = &self.chunks[index];
        let state = &mut self.states[index];
        state.attempts += 1;

        match dispatcher.narrate(chunk).await {
            Ok(narrated) => state.mark_ready(narrated.segment, narrated.cached),
            Err(e) => {
                log::warn!("{} failed: {}", chunk.label(), e);
                state.mark_failed(e.to_string());
            }
        }

        Some(&self.states[index])
    }

    /// Narrate the given chunks in order, skipping ones already ready.
    pub async fn generate_many<I, F>(
        &mut self,
        ordinals: I,
        dispatcher: &mut Dispatcher,
        mut on_done: F,
    ) -> Progress
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(&SegmentState),
    {
        for ordinal in ordinals {
            if let Some(state) = self.generate(ordinal, dispatcher).await {
                on_done(state);
            }
        }
        self.progress()
    }

    /// Narrate every pending chunk. Failures do not stop the run.
    pub async fn generate_all<F>(&mut self, dispatcher: &mut Dispatcher, on_done: F) -> Progress
    where
        F: FnMut(&SegmentState),
    {
        let pending: Vec<usize> = self
            .states
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.ordinal)
            .collect();
        self.generate_many(pending, dispatcher, on_done).await
    }

    /// Narrate again only the chunks that failed.
    pub async fn retry_failed<F>(&mut self, dispatcher: &mut Dispatcher, on_done: F) -> Progress
    where
        F: FnMut(&SegmentState),
    {
        let failed = self.failed_ordinals();
        self.generate_many(failed, dispatcher, on_done).await
    }
}
