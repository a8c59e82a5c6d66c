//! Retrieval pipeline: coarse vector search, rerank/compression, and
//! grounded generation.
//!
//! # Architecture
//!
//! ```text
//! question
//!   ↓ Embedder (OpenAI | hash)
//! DocumentStore::search (Qdrant | in-memory), top K
//!   ↓
//! Reranker::rerank (Cohere | lexical), top N ⊆ K
//!   ↓ provenance-headed context + RAG template
//! ModelGateway (temperature 0) → RetrievalAnswer { answer, documents }
//! ```

pub mod cohere;
pub mod embedding;
pub mod ingest;
pub mod pipeline;
pub mod qdrant;
pub mod rerank;
pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

pub use cohere::CohereReranker;
pub use embedding::{Embedder, HashEmbedder, OpenAiEmbedder, create_embedder};
pub use pipeline::{RetrievalAnswer, RetrievalPipeline};
pub use qdrant::QdrantStore;
pub use rerank::{LexicalReranker, Reranker};
pub use store::{DocumentStore, InMemoryStore};

use crate::agent::config::AgentConfig;
use crate::agent::gateway::ModelGateway;
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Builds the document store selected by configuration.
///
/// A Qdrant URL selects the remote collection; otherwise the data
/// directory is ingested into an in-memory index.
///
/// # Errors
///
/// Returns [`AgentError::Configuration`] if neither a Qdrant URL nor a
/// readable data directory is configured, or if indexing fails.
pub async fn build_store(config: &AgentConfig) -> Result<Arc<dyn DocumentStore>, AgentError> {
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(config)?);

    if let Some(ref url) = config.qdrant_url {
        info!(url = %url, collection = %config.qdrant_collection, "using Qdrant document store");
        return Ok(Arc::new(QdrantStore::new(url, config, embedder)?));
    }

    let Some(ref dir) = config.data_dir else {
        return Err(AgentError::Configuration {
            message: "no document source: set QDRANT_URL or POLICY_AGENT_DATA_DIR".to_string(),
        });
    };

    let documents = ingest::load_directory(dir).map_err(|e| AgentError::Configuration {
        message: format!("failed to read data directory {}: {e}", dir.display()),
    })?;
    if documents.is_empty() {
        warn!(dir = %dir.display(), "data directory contains no .txt or .md documents");
    }

    let store = InMemoryStore::from_documents(embedder, documents)
        .await
        .map_err(|e| AgentError::Configuration {
            message: format!("failed to index documents: {e}"),
        })?;
    info!(
        dir = %dir.display(),
        chunks = store.len(),
        "using in-memory document store"
    );
    Ok(Arc::new(store))
}

/// Builds the reranker: Cohere when a key is configured, lexical otherwise.
///
/// # Errors
///
/// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
pub fn build_reranker(config: &AgentConfig) -> Result<Arc<dyn Reranker>, AgentError> {
    match config.cohere_api_key {
        Some(ref key) => Ok(Arc::new(CohereReranker::new(key, config)?)),
        None => {
            warn!("COHERE_API_KEY not set, falling back to lexical reranking");
            Ok(Arc::new(LexicalReranker))
        }
    }
}

/// Builds the full retrieval pipeline from configuration.
///
/// Generation uses the configured RAG model through `provider` and the
/// RAG template from `prompts`.
///
/// # Errors
///
/// Returns [`AgentError::Configuration`] if the store or reranker cannot
/// be built.
pub async fn build_pipeline(
    config: &AgentConfig,
    provider: Arc<dyn LlmProvider>,
    prompts: &PromptSet,
) -> Result<RetrievalPipeline, AgentError> {
    let store = build_store(config).await?;
    let reranker = build_reranker(config)?;
    let generator = ModelGateway::for_generation(provider, config);
    Ok(RetrievalPipeline::new(store, reranker, generator)
        .with_limits(config.retrieval_k, config.rerank_top_n)
        .with_template(prompts.rag_template.clone())
        .with_timeout(config.timeout))
}
