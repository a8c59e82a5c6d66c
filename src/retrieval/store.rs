//! Document stores for coarse retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::embedding::{Embedder, cosine_similarity};
use crate::core::Document;
use crate::error::RetrievalError;

/// Number of texts sent to the embedder per request during indexing.
const EMBED_BATCH_SIZE: usize = 64;

/// A searchable collection of document chunks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &'static str;

    /// Returns up to `k` documents most similar to `query`, best first.
    ///
    /// Every returned document carries its similarity score. No score
    /// threshold is applied.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] if the query cannot be
    /// embedded, or [`RetrievalError::DocumentStore`] if the store fails.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError>;
}

/// Brute-force cosine search over documents embedded at build time.
///
/// Contents are fixed after construction and shared read-only.
pub struct InMemoryStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Document, Vec<f32>)>,
}

impl InMemoryStore {
    /// Embeds `documents` in batches and builds the index.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] if any batch fails, or if the
    /// embedder returns the wrong number of vectors.
    pub async fn from_documents(
        embedder: Arc<dyn Embedder>,
        documents: Vec<Document>,
    ) -> Result<Self, RetrievalError> {
        let mut entries = Vec::with_capacity(documents.len());
        for batch in documents.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let vectors = embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(RetrievalError::Embedding {
                    message: format!(
                        "expected {} embeddings, received {}",
                        batch.len(),
                        vectors.len()
                    ),
                });
            }
            entries.extend(batch.iter().cloned().zip(vectors));
        }

        debug!(
            documents = entries.len(),
            embedder = embedder.name(),
            "in-memory index built"
        );
        Ok(Self { embedder, entries })
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("embedder", &self.embedder.name())
            .field("documents", &self.entries.len())
            .finish()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, cosine_similarity(&query_vector, vector)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| self.entries[i].0.with_score(score))
            .collect())
    }
}
