//! Retrieved document chunks and their provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A chunk of a policy document returned by the document store.
///
/// `source` and `page` carry the provenance the generation step needs to
/// cite. The reranker never mutates a document; it returns re-scored copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Chunk text.
    pub content: String,
    /// File path or URI the chunk came from.
    pub source: String,
    /// 1-based page number, when the source is paginated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Relevance score assigned by the last ranking stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Creates an unscored document.
    #[must_use]
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
            score: None,
        }
    }

    /// Returns a copy carrying the given score.
    #[must_use]
    pub fn with_score(&self, score: f32) -> Self {
        Self {
            score: Some(score),
            ..self.clone()
        }
    }

    /// Returns `true` if both documents are the same chunk, ignoring score.
    #[must_use]
    pub fn same_chunk(&self, other: &Self) -> bool {
        self.source == other.source && self.page == other.page && self.content == other.content
    }

    /// Human-readable citation, e.g. `data/pub5108.txt, page 12`.
    #[must_use]
    pub fn citation(&self) -> Citation<'_> {
        Citation(self)
    }
}

/// Display adapter returned by [`Document::citation`].
#[derive(Debug, Clone, Copy)]
pub struct Citation<'a>(&'a Document);

impl fmt::Display for Citation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.page {
            Some(page) => write!(f, "{}, page {page}", self.0.source),
            None => f.write_str(&self.0.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_score_keeps_provenance() {
        let doc = Document::new("text", "pub5108.pdf", Some(4));
        let scored = doc.with_score(0.9);
        assert_eq!(scored.score, Some(0.9));
        assert_eq!(scored.source, "pub5108.pdf");
        assert_eq!(scored.page, Some(4));
        assert!(doc.score.is_none());
    }

    #[test]
    fn test_same_chunk_ignores_score() {
        let doc = Document::new("text", "a.txt", None);
        assert!(doc.same_chunk(&doc.with_score(0.1)));
        assert!(!doc.same_chunk(&Document::new("text", "a.txt", Some(1))));
    }

    #[test]
    fn test_citation() {
        let doc = Document::new("x", "data/pub5108.txt", Some(12));
        assert_eq!(doc.citation().to_string(), "data/pub5108.txt, page 12");
        let doc = Document::new("x", "notes.md", None);
        assert_eq!(doc.citation().to_string(), "notes.md");
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let doc = Document::new("x", "notes.md", None);
        let json = serde_json::to_string(&doc).unwrap_or_default();
        assert!(!json.contains("page"));
        assert!(!json.contains("score"));
    }
}
