//! PDF text extraction and the documents it produces.

use sha2::{Digest, Sha256};

use crate::error::ExtractionError;

/// Turns document bytes into page texts, in reading order.
pub trait TextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Extractor for PDF files, built on lopdf's text layer decoding.
///
/// No layout analysis: each page's text is taken in content-stream order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(ExtractionError::Encrypted);
        }

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());

        // get_pages is keyed by 1-based page number, so iteration is in order
        for &page_number in pages.keys() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    log::warn!("page {}: text could not be decoded: {}", page_number, e);
                    texts.push(String::new());
                }
            }
        }

        Ok(texts)
    }
}

/// Text extracted from one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Content hash of the source bytes
    id: String,
    /// Page texts in reading order
    pages: Vec<String>,
}

impl Document {
    /// Extract a document, rejecting inputs that yield no text.
    ///
    /// Empty bytes are rejected before the extractor runs.
    pub fn extract(bytes: &[u8], extractor: &dyn TextExtractor) -> Result<Self, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let pages = extractor.extract_pages(bytes)?;
        if pages.iter().all(|p| p.trim().is_empty()) {
            return Err(ExtractionError::NoText { pages: pages.len() });
        }

        Ok(Self {
            id: content_id(bytes),
            pages,
        })
    }

    /// Build a document from already-extracted pages.
    pub fn from_pages(id: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            id: id.into(),
            pages,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages concatenated in order, with no separator.
    pub fn text(&self) -> String {
        self.pages.concat()
    }

    /// Approximate word count across all pages
    pub fn total_words(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.split_whitespace().count())
            .sum()
    }
}

/// Identify document content: first 16 hex characters of its SHA256.
pub fn content_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Returns fixed pages and records whether it was called.
    struct FixedPages {
        pages: Vec<&'static str>,
        called: Cell<bool>,
    }

    impl FixedPages {
        fn new(pages: Vec<&'static str>) -> Self {
            Self {
                pages,
                called: Cell::new(false),
            }
        }
    }

    impl TextExtractor for FixedPages {
        fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            self.called.set(true);
            Ok(self.pages.iter().map(|p| p.to_string()).collect())
        }
    }

    #[test]
    fn test_empty_bytes_rejected_before_extraction() {
        let extractor = FixedPages::new(vec!["text"]);
        let result = Document::extract(b"", &extractor);
        assert_eq!(result, Err(ExtractionError::Empty));
        assert!(!extractor.called.get());
    }

    #[test]
    fn test_pages_concatenated_without_separator() {
        let extractor = FixedPages::new(vec!["Page one ends", "Page two\n", "three"]);
        let doc = Document::extract(b"%PDF-fake", &extractor).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.text(), "Page one endsPage two\nthree");
        assert_eq!(doc.total_words(), 6);
    }

    #[test]
    fn test_image_only_document_is_an_error() {
        let extractor = FixedPages::new(vec!["", "  \n", ""]);
        let result = Document::extract(b"%PDF-scanned", &extractor);
        assert_eq!(result, Err(ExtractionError::NoText { pages: 3 }));
    }

    #[test]
    fn test_zero_pages_is_an_error() {
        let extractor = FixedPages::new(vec![]);
        let result = Document::extract(b"%PDF-blank", &extractor);
        assert_eq!(result, Err(ExtractionError::NoText { pages: 0 }));
    }

    #[test]
    fn test_document_id_from_content() {
        let extractor = FixedPages::new(vec!["text"]);
        let a = Document::extract(b"same bytes", &extractor).unwrap();
        let b = Document::extract(b"same bytes", &extractor).unwrap();
        let c = Document::extract(b"other bytes", &extractor).unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().len(), 16);
        assert!(a.id().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_pdf_extractor_rejects_garbage() {
        let result = Document::extract(b"definitely not a pdf", &PdfExtractor);
        assert!(matches!(result, Err(ExtractionError::Malformed(_))));
    }

    #[test]
    fn test_pdf_extractor_empty_bytes() {
        assert_eq!(
            Document::extract(&[], &PdfExtractor),
            Err(ExtractionError::Empty)
        );
    }
}
