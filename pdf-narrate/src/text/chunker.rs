//! Fixed-size chunking of cleaned text for narration.

use super::{Chunk, ChunkSpec, ChunkUnit};

/// Split text into numbered chunks according to `spec`.
///
/// Character chunks are exact slices, so joining them gives back `text`.
/// Word chunks re-join their words with single spaces. Empty text gives no
/// chunks.
pub fn chunk(text: &str, spec: &ChunkSpec) -> Vec<Chunk> {
    let size = spec.size.get();
    let pieces = match spec.unit {
        ChunkUnit::Characters => split_on_chars(text, size),
        ChunkUnit::Words => split_on_words(text, size),
    };

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(i + 1, text))
        .collect()
}

/// Split text every `size` characters (Unicode scalar values).
fn split_on_chars(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

/// Group whitespace-separated words `size` at a time.
fn split_on_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|group| group.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(unit: ChunkUnit, size: usize) -> ChunkSpec {
        ChunkSpec::new(unit, size).unwrap()
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_chars_split() {
        let chunks = chunk("abcdefgh", &spec(ChunkUnit::Characters, 3));
        assert_eq!(texts(&chunks), vec!["abc", "def", "gh"]);
        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn test_chars_exact_multiple() {
        let chunks = chunk("abcdef", &spec(ChunkUnit::Characters, 3));
        assert_eq!(texts(&chunks), vec!["abc", "def"]);
    }

    #[test]
    fn test_chars_multibyte() {
        let chunks = chunk("αβγδε", &spec(ChunkUnit::Characters, 2));
        assert_eq!(texts(&chunks), vec!["αβ", "γδ", "ε"]);
    }

    #[test]
    fn test_chars_size_larger_than_text() {
        let chunks = chunk("short", &spec(ChunkUnit::Characters, 2000));
        assert_eq!(texts(&chunks), vec!["short"]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk("", &spec(ChunkUnit::Characters, 3)).is_empty());
        assert!(chunk("", &spec(ChunkUnit::Words, 3)).is_empty());
        assert!(chunk("  \n ", &spec(ChunkUnit::Words, 3)).is_empty());
    }

    #[test]
    fn test_split_on_words() {
        let chunks = chunk("one two  three\nfour five", &spec(ChunkUnit::Words, 2));
        assert_eq!(texts(&chunks), vec!["one two", "three four", "five"]);
    }

    proptest! {
        #[test]
        fn prop_chars_round_trip(text in "\\PC{0,200}", size in 1usize..50) {
            let chunks = chunk(&text, &spec(ChunkUnit::Characters, size));
            let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(joined, text.clone());

            let len = text.chars().count();
            prop_assert_eq!(chunks.len(), len.div_ceil(size));
            for c in &chunks {
                prop_assert!(c.text.chars().count() <= size);
            }
        }

        #[test]
        fn prop_words_preserve_sequence(words in prop::collection::vec("[a-z]{1,6}", 0..40), size in 1usize..8) {
            let text = words.join("  ");
            let chunks = chunk(&text, &spec(ChunkUnit::Words, size));
            let rejoined: Vec<String> = chunks
                .iter()
                .flat_map(|c| c.text.split(' ').map(str::to_string).collect::<Vec<_>>())
                .collect();
            prop_assert_eq!(rejoined, words.clone());
            prop_assert_eq!(chunks.len(), words.len().div_ceil(size));
        }
    }
}
