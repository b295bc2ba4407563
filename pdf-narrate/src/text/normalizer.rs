//! Whitespace collapse and spoken-form substitution for TTS.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Symbols and acronyms a narrator mispronounces, with their spoken forms.
///
/// Applied in order. No key may occur inside any replacement. A key can
/// still form across a replacement's edge ("m³/" + "square ..."), so the
/// table is reapplied until the text stops changing.
pub const SPOKEN_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("HEC-RAS", "H E C R A S"),
    ("SWMM", "S W M M"),
    ("β", "beta"),
    ("α", "alpha"),
    ("μ", "mu"),
    ("°C", "degrees Celsius"),
    ("m³/s", "cubic meters per second"),
    ("km²", "square kilometers"),
];

/// Cap on substitution passes; every table in practice settles in two.
const MAX_SUBSTITUTION_PASSES: usize = 8;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A user-configured literal replacement, applied after the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Normalize extracted text for narration.
///
/// This function:
/// - Collapses every whitespace run (including newlines) to a single space
/// - Replaces symbols and acronyms with their spoken forms
/// - Trims the result
pub fn normalize(raw: &str) -> String {
    normalize_with(raw, &[])
}

/// Like [`normalize`], with extra substitutions applied after the built-in ones.
pub fn normalize_with(raw: &str, extra: &[Substitution]) -> String {
    let mut text = collapse_whitespace(raw);

    for _ in 0..MAX_SUBSTITUTION_PASSES {
        let next = substitute_once(&text, extra);
        if next == text {
            break;
        }
        text = next;
    }

    text
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// One pass over both tables. Replacements may leave whitespace runs (an
/// empty replacement between two spaces), so the result is collapsed again.
fn substitute_once(text: &str, extra: &[Substitution]) -> String {
    let mut text = text.to_string();

    for (from, to) in SPOKEN_SUBSTITUTIONS {
        if text.contains(from) {
            text = text.replace(from, to);
        }
    }

    for sub in extra.iter().filter(|s| !s.from.is_empty()) {
        if text.contains(&sub.from) {
            text = text.replace(&sub.from, &sub.to);
        }
    }

    collapse_whitespace(&text)
}

/// Reject user substitutions that would rewrite their own output.
///
/// No key, built-in or extra, may occur inside an extra replacement, and no
/// extra key may occur inside a built-in replacement.
pub fn validate_substitutions(extra: &[Substitution]) -> Result<(), PipelineError> {
    let keys: Vec<&str> = SPOKEN_SUBSTITUTIONS
        .iter()
        .map(|(from, _)| *from)
        .chain(extra.iter().map(|s| s.from.as_str()))
        .filter(|k| !k.is_empty())
        .collect();

    for sub in extra {
        if let Some(key) = keys.iter().find(|k| sub.to.contains(*k)) {
            return Err(PipelineError::config(format!(
                "substitution '{}' -> '{}' produces the key '{}'",
                sub.from, sub.to, key
            )));
        }
    }

    for sub in extra.iter().filter(|s| !s.from.is_empty()) {
        if let Some((from, to)) = SPOKEN_SUBSTITUTIONS
            .iter()
            .find(|(_, to)| to.contains(sub.from.as_str()))
        {
            return Err(PipelineError::config(format!(
                "substitution key '{}' occurs in the built-in replacement '{}' -> '{}'",
                sub.from, from, to
            )));
        }
    }

    Ok(())
}
