//! Audio memoization: (provider, voice, text) -> audio.
//!
//! Entries live in memory and, for a persistent cache, as files named by
//! the key's digest. Losing any entry only means asking the engine again.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tts_client::{AudioFormat, SpeechAudio};

/// Formats probed when loading from disk.
const DISK_FORMATS: [AudioFormat; 2] = [AudioFormat::Mp3, AudioFormat::Wav];

/// Get the default on-disk audio cache directory.
pub fn default_cache_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("pdf-narrate").join("audio"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?;

    Ok(dir)
}

/// Compute the cache key for a narration request.
pub fn cache_key(provider: &str, voice: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update([0]);
    hasher.update(voice.as_bytes());
    hasher.update([0]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Memo of narrated audio.
#[derive(Debug, Default)]
pub struct AudioCache {
    memory: HashMap<String, SpeechAudio>,
    dir: Option<PathBuf>,
    hits: usize,
    misses: usize,
}

impl AudioCache {
    /// Cache that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache that also stores audio files under `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self {
            dir: Some(dir),
            ..Self::default()
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn file_path(dir: &Path, key: &str, format: AudioFormat) -> PathBuf {
        dir.join(format!("{}.{}", key, format.extension()))
    }

    /// Look up audio by key, falling back to disk.
    pub fn get(&mut self, key: &str) -> Option<SpeechAudio> {
        if let Some(audio) = self.memory.get(key) {
            self.hits += 1;
            return Some(audio.clone());
        }

        if let Some(audio) = self.load_from_disk(key) {
            self.hits += 1;
            self.memory.insert(key.to_string(), audio.clone());
            return Some(audio);
        }

        self.misses += 1;
        None
    }

    fn load_from_disk(&self, key: &str) -> Option<SpeechAudio> {
        let dir = self.dir.as_deref()?;
        DISK_FORMATS.into_iter().find_map(|format| {
            let bytes = fs::read(Self::file_path(dir, key, format)).ok()?;
            if bytes.is_empty() {
                return None;
            }
            Some(SpeechAudio { bytes, format })
        })
    }

    /// Store audio under key. Disk write failures are logged, not returned.
    pub fn insert(&mut self, key: &str, audio: SpeechAudio) {
        if let Some(dir) = self.dir.as_deref() {
            let path = Self::file_path(dir, key, audio.format);
            if let Err(e) = fs::write(&path, &audio.bytes) {
                log::warn!("Failed to write cached audio {}: {}", path.display(), e);
            }
        }
        self.memory.insert(key.to_string(), audio);
    }

    /// Forget all entries, including files on disk.
    pub fn clear(&mut self) -> Result<()> {
        self.memory.clear();

        if let Some(dir) = self.dir.as_deref() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                let is_audio = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(AudioFormat::from_extension)
                    .is_some();
                if is_audio {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
        }

        Ok(())
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mp3(bytes: &[u8]) -> SpeechAudio {
        SpeechAudio {
            bytes: bytes.to_vec(),
            format: AudioFormat::Mp3,
        }
    }

    #[test]
    fn test_cache_key() {
        let key = cache_key("google-translate", "en", "Hello.");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("google-translate", "en", "Hello."));
        assert_ne!(key, cache_key("google-translate", "fr", "Hello."));
        assert_ne!(key, cache_key("openai", "en", "Hello."));
        // Separators keep field boundaries distinct
        assert_ne!(cache_key("a", "bc", "d"), cache_key("ab", "c", "d"));
    }

    #[test]
    fn test_in_memory_round_trip() {
        let mut cache = AudioCache::in_memory();
        assert!(cache.get("k").is_none());
        cache.insert("k", mp3(b"audio"));
        assert_eq!(cache.get("k"), Some(mp3(b"audio")));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_persistent_survives_new_instance() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = AudioCache::persistent(temp_dir.path()).unwrap();
        cache.insert("abc", mp3(b"bytes"));
        assert!(temp_dir.path().join("abc.mp3").exists());

        let mut reopened = AudioCache::persistent(temp_dir.path()).unwrap();
        assert!(reopened.is_empty());
        assert_eq!(reopened.get("abc"), Some(mp3(b"bytes")));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_clear_removes_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"keep").unwrap();
        let mut cache = AudioCache::persistent(temp_dir.path()).unwrap();
        cache.insert("abc", mp3(b"bytes"));

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(!temp_dir.path().join("abc.mp3").exists());
        assert!(temp_dir.path().join("notes.txt").exists());
        assert!(cache.get("abc").is_none());
    }

    #[test]
    fn test_empty_file_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("abc.wav"), b"").unwrap();
        let mut cache = AudioCache::persistent(temp_dir.path()).unwrap();
        assert!(cache.get("abc").is_none());
    }
}
