//! Reranking / contextual compression.
//!
//! A reranker takes the coarse candidates and returns the few that best
//! answer the question, best first. Whatever the backend returns, the
//! pipeline only ever sees a subset of its input: see [`select`].

use std::collections::HashSet;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::core::Document;
use crate::error::RetrievalError;

/// Reorders and trims candidate documents by relevance to a query.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Reranker name for logging.
    fn name(&self) -> &'static str;

    /// Returns at most `top_n` documents drawn from `documents`, ordered by
    /// descending relevance. Irrelevant documents may be dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Reranker`] if the backend fails.
    async fn rerank(
        &self,
        query: &str,
        documents: &[Document],
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError>;
}

/// Builds the reranked output from `(index, score)` pairs.
///
/// Indices outside `documents` and repeated indices are discarded, and at
/// most `top_n` entries are kept, so the result is always a subset of the
/// input no larger than it. Entries keep the order given.
#[must_use]
pub fn select(documents: &[Document], ranked: &[(usize, f32)], top_n: usize) -> Vec<Document> {
    let mut seen = HashSet::new();
    ranked
        .iter()
        .filter(|(index, _)| *index < documents.len() && seen.insert(*index))
        .take(top_n)
        .map(|&(index, score)| documents[index].with_score(score))
        .collect()
}

/// Local reranker scoring term overlap between query and document.
///
/// Used when no Cohere key is configured. Scores are the fraction of
/// distinct query terms (ignoring very short words) found in the document;
/// documents sharing no term are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalReranker;

/// Words shorter than this carry too little signal to count.
const MIN_TERM_LEN: usize = 3;

fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

impl LexicalReranker {
    /// Scores every document against the query, best first.
    fn score(query: &str, documents: &[Document]) -> Vec<(usize, f32)> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        #[allow(clippy::cast_precision_loss)]
        let total = query_terms.len() as f32;
        let mut scored: Vec<(usize, f32)> = documents
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| {
                let doc_terms = terms(&doc.content);
                let hits = query_terms.intersection(&doc_terms).count();
                #[allow(clippy::cast_precision_loss)]
                let score = hits as f32 / total;
                (hits > 0).then_some((i, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[Document],
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        Ok(select(documents, &Self::score(query, documents), top_n))
    }
}
