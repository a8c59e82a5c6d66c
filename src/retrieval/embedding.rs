//! Text embedding backends.
//!
//! [`OpenAiEmbedder`] calls the embeddings API; [`HashEmbedder`] is a
//! deterministic feature-hashing embedder for offline use and tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::agent::config::{AgentConfig, EmbedderKind};
use crate::agent::providers::{map_openai_error, openai_client};
use crate::error::{AgentError, RetrievalError};

/// Default dimensionality of [`HashEmbedder`] vectors.
pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

/// Converts text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedder name for logging.
    fn name(&self) -> &'static str;

    /// Embeds a batch of texts, returning one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] on backend failure.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;

    /// Embeds a single query string.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Embedding`] on backend failure or when the
    /// backend returns no vector.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| RetrievalError::Embedding {
                message: "no embedding returned for query".to_string(),
            })
    }
}

/// Creates the embedder selected in configuration.
///
/// # Errors
///
/// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
pub fn create_embedder(config: &AgentConfig) -> Result<Box<dyn Embedder>, AgentError> {
    match config.embedder {
        EmbedderKind::OpenAi => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        EmbedderKind::Hash => Ok(Box::new(HashEmbedder::default())),
    }
}

/// Embeddings through an `OpenAI`-compatible API.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder using the configured embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        Ok(Self {
            client: openai_client(config)?,
            model: config.embedding_model.clone(),
        })
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|e| RetrievalError::Embedding {
                message: e.to_string(),
            })?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| RetrievalError::Embedding {
                message: map_openai_error(&e).to_string(),
            })?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(RetrievalError::Embedding {
                message: format!(
                    "expected {} embeddings, received {}",
                    texts.len(),
                    data.len()
                ),
            });
        }
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// Lowercased words are hashed into a fixed number of buckets and the
/// result is L2-normalised, so texts sharing vocabulary land close under
/// cosine similarity.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Creates an embedder producing vectors of the given size (minimum 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Vector dimensionality.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for word in text.unicode_words() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let hash = hasher.finish();
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Cosine similarity of two vectors; 0.0 for empty, mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    similarity
}
