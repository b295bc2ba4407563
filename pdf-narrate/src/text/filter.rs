//! Reference, citation and section filtering for scholarly text.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Headings that start back matter. Everything from the first one on is dropped.
pub const TRAILING_SECTION_MARKERS: &[&str] = &[
    "references",
    "bibliography",
    "works cited",
    "reference list",
    "literature cited",
];

/// Headings that open the body of a paper.
pub const MAIN_SECTION_HEADERS: &[&str] = &[
    "abstract",
    "introduction",
    "method",
    "methodology",
    "materials and methods",
    "results",
    "discussion",
    "conclusion",
    "conclusions",
];

/// Author-year parenthetical: "(Smith et al., 2019)", "(Jones, 2020; Lee, 2021b)".
static AUTHOR_YEAR_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^()]*?\b(?:1[6-9]|20)\d{2}[a-z]?\b[^()]*\)").expect("valid regex")
});

/// Numeric bracket: "[12]", "[3-5]", "[3–5]", "[1, 4-6]".
static NUMERIC_CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*\d+(?:\s*[-–]\s*\d+)?(?:\s*,\s*\d+(?:\s*[-–]\s*\d+)?)*\s*\]")
        .expect("valid regex")
});

static DEFAULT_FILTER: Lazy<ReferenceFilter> = Lazy::new(ReferenceFilter::default);

/// How aggressively to strip scholarly boilerplate before narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterLevel {
    /// Narrate everything
    None,
    /// Drop the bibliography
    SkipReferences,
    /// Drop inline citations, then the bibliography
    #[default]
    SkipReferencesAndCitations,
    /// Keep only abstract-to-conclusion, without citations
    MainSectionsOnly,
}

impl FilterLevel {
    pub const ALL: [FilterLevel; 4] = [
        FilterLevel::None,
        FilterLevel::SkipReferences,
        FilterLevel::SkipReferencesAndCitations,
        FilterLevel::MainSectionsOnly,
    ];

    /// Config-file / CLI name of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SkipReferences => "skip-references",
            Self::SkipReferencesAndCitations => "skip-references-and-citations",
            Self::MainSectionsOnly => "main-sections-only",
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterLevel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                PipelineError::config(format!(
                    "unknown filter level '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(|l| l.as_str()).join(", ")
                ))
            })
    }
}

/// Case-insensitive finder for section headings.
///
/// A heading only matches at the start of a line or right after whitespace,
/// and must end on a word boundary, so "preferences" or "referenced" never
/// match "references".
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    regex: Regex,
}

impl SectionMatcher {
    pub fn new<S: AsRef<str>>(headings: &[S]) -> Result<Self, PipelineError> {
        let alternatives: Vec<String> = headings
            .iter()
            .filter_map(|h| heading_pattern(h.as_ref()))
            .collect();

        if alternatives.is_empty() {
            return Err(PipelineError::config("section marker list is empty"));
        }

        let pattern = format!(r"(?:^|\s)((?:{}))", alternatives.join("|"));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| PipelineError::config(format!("invalid section markers: {}", e)))?;

        Ok(Self { regex })
    }

    /// Offset of the earliest heading word itself.
    pub fn find_heading(&self, text: &str) -> Option<usize> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.start())
    }

    /// Offset where text should be cut for the earliest heading: the
    /// separating whitespace before it, or the heading when it opens a line.
    pub fn find_cut(&self, text: &str) -> Option<usize> {
        self.regex.find(text).map(|m| m.start())
    }
}

/// Regex for one heading: words joined by any whitespace, closed by a word
/// boundary when the heading ends in a word character.
fn heading_pattern(heading: &str) -> Option<String> {
    let words: Vec<String> = heading.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let mut pattern = words.join(r"\s+");
    if heading.trim_end().ends_with(|c: char| c.is_alphanumeric() || c == '_') {
        pattern.push_str(r"\b");
    }
    Some(pattern)
}

/// Truncate `text` before the first trailing-section heading, if any.
pub fn strip_trailing_section<'a>(text: &'a str, markers: &SectionMatcher) -> &'a str {
    match markers.find_cut(text) {
        Some(cut) => &text[..cut],
        None => text,
    }
}

/// Delete author-year and numeric citations.
///
/// Deletion repeats until nothing matches, so a citation exposed by removing
/// a nested one is removed too. Surrounding whitespace is left as-is.
pub fn strip_inline_citations(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = AUTHOR_YEAR_CITATION.replace_all(&current, "");
        let next = NUMERIC_CITATION.replace_all(&next, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Keep the span from the first main-section heading up to the first
/// trailing-section heading.
///
/// Without any main-section heading the text is returned unchanged. When the
/// trailing heading comes before the first main heading the span is empty.
pub fn restrict_to_main_sections<'a>(
    text: &'a str,
    headers: &SectionMatcher,
    end_markers: &SectionMatcher,
) -> &'a str {
    let Some(start) = headers.find_heading(text) else {
        return text;
    };
    let end = end_markers.find_cut(text).unwrap_or(text.len());
    if start >= end {
        return "";
    }
    &text[start..end]
}

/// Compiled section markers for [`FilterLevel`] transforms.
#[derive(Debug, Clone)]
pub struct ReferenceFilter {
    trailing: SectionMatcher,
    main: SectionMatcher,
}

impl ReferenceFilter {
    pub fn new<S: AsRef<str>>(trailing: &[S], main: &[S]) -> Result<Self, PipelineError> {
        Ok(Self {
            trailing: SectionMatcher::new(trailing)?,
            main: SectionMatcher::new(main)?,
        })
    }

    pub fn apply(&self, text: &str, level: FilterLevel) -> String {
        match level {
            FilterLevel::None => text.to_string(),
            FilterLevel::SkipReferences => strip_trailing_section(text, &self.trailing).to_string(),
            FilterLevel::SkipReferencesAndCitations => {
                let without_citations = strip_inline_citations(text);
                strip_trailing_section(&without_citations, &self.trailing).to_string()
            }
            FilterLevel::MainSectionsOnly => {
                let body = restrict_to_main_sections(text, &self.main, &self.trailing);
                strip_inline_citations(body)
            }
        }
    }
}

impl Default for ReferenceFilter {
    fn default() -> Self {
        Self::new(TRAILING_SECTION_MARKERS, MAIN_SECTION_HEADERS)
            .expect("built-in section markers compile")
    }
}

/// Apply `level` with the built-in section markers.
pub fn filter(text: &str, level: FilterLevel) -> String {
    DEFAULT_FILTER.apply(text, level)
}
