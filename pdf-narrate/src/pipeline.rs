//! Cleaning pipeline: normalize, filter and chunk extracted document text.
//!
//! Each stage produces new text from the previous one. Cleaned text is cached
//! per (document, filter level, cleaning profile), so changing the filter
//! level for the same document never reuses text cleaned under another level.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::document::Document;
use crate::error::Result;
use crate::text::{
    self, Chunk, ChunkSpec, FilterLevel, ReferenceFilter, Substitution, normalize_with,
};

/// Everything besides the filter level that shapes cleaned text.
#[derive(Debug, Clone)]
pub struct CleaningProfile {
    substitutions: Vec<Substitution>,
    filter: ReferenceFilter,
    fingerprint: String,
}

impl CleaningProfile {
    /// Compile a profile; bad section markers or self-feeding substitutions
    /// are a configuration error.
    pub fn new<S: AsRef<str>>(
        substitutions: Vec<Substitution>,
        trailing_markers: &[S],
        main_headers: &[S],
    ) -> Result<Self> {
        text::normalizer::validate_substitutions(&substitutions)?;
        let filter = ReferenceFilter::new(trailing_markers, main_headers)?;

        let mut hasher = Sha256::new();
        for sub in &substitutions {
            hasher.update(sub.from.as_bytes());
            hasher.update([0]);
            hasher.update(sub.to.as_bytes());
            hasher.update([0]);
        }
        for list in [trailing_markers, main_headers] {
            hasher.update([1]);
            for marker in list {
                hasher.update(marker.as_ref().to_lowercase().as_bytes());
                hasher.update([0]);
            }
        }
        let fingerprint = format!("{:x}", hasher.finalize())[..16].to_string();

        Ok(Self {
            substitutions,
            filter,
            fingerprint,
        })
    }

    /// Normalize then filter raw text.
    pub fn clean(&self, raw: &str, level: FilterLevel) -> String {
        let normalized = normalize_with(raw, &self.substitutions);
        self.filter.apply(&normalized, level)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Default for CleaningProfile {
    fn default() -> Self {
        Self::new(
            Vec::new(),
            text::filter::TRAILING_SECTION_MARKERS,
            text::filter::MAIN_SECTION_HEADERS,
        )
        .expect("built-in section markers compile")
    }
}

/// Identifies one cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub document_id: String,
    pub level: FilterLevel,
    pub profile: String,
}

/// Memo of cleaned texts. Entries can be dropped at any time.
#[derive(Debug, Default)]
pub struct TextCache {
    entries: HashMap<CacheKey, Arc<str>>,
    hits: usize,
    misses: usize,
}

impl TextCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&mut self, key: &CacheKey) -> Option<Arc<str>> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn insert(&mut self, key: CacheKey, text: Arc<str>) {
        self.entries.insert(key, text);
    }

    /// Drop every entry for a document. Returns how many were removed.
    pub fn invalidate(&mut self, document_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.document_id != document_id);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

/// Cleaned text of a document and its chunks.
#[derive(Debug, Clone)]
pub struct PreparedText {
    pub cleaned: Arc<str>,
    pub chunks: Vec<Chunk>,
}

/// Runs the cleaning stages and owns the cleaned-text cache.
#[derive(Debug, Default)]
pub struct Pipeline {
    profile: CleaningProfile,
    cache: TextCache,
}

impl Pipeline {
    pub fn new(profile: CleaningProfile) -> Self {
        Self {
            profile,
            cache: TextCache::new(),
        }
    }

    /// Cleaned text of `document` at `level`, computed at most once per key.
    pub fn clean(&mut self, document: &Document, level: FilterLevel) -> Arc<str> {
        let key = CacheKey {
            document_id: document.id().to_string(),
            level,
            profile: self.profile.fingerprint().to_string(),
        };

        if let Some(text) = self.cache.get(&key) {
            log::debug!("cleaned text cache hit for {} at {}", document.id(), level);
            return text;
        }

        let raw = document.text();
        let cleaned: Arc<str> = self.profile.clean(&raw, level).into();
        log::debug!(
            "cleaned {} at {}: {} -> {} characters",
            document.id(),
            level,
            raw.chars().count(),
            cleaned.chars().count()
        );

        self.cache.insert(key, Arc::clone(&cleaned));
        cleaned
    }

    /// Clean and chunk a document.
    pub fn prepare(
        &mut self,
        document: &Document,
        level: FilterLevel,
        spec: &ChunkSpec,
    ) -> PreparedText {
        let cleaned = self.clean(document, level);
        let chunks = text::chunk(&cleaned, spec);
        PreparedText { cleaned, chunks }
    }

    pub fn cache(&self) -> &TextCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TextCache {
        &mut self.cache
    }
}
