//! Retrieve, rerank, then generate from the surviving context only.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::rerank::Reranker;
use super::store::DocumentStore;
use crate::agent::gateway::ModelGateway;
use crate::agent::message::user_message;
use crate::agent::prompt::{NO_CONTEXT_ANSWER, RAG_TEMPLATE, build_context, render_rag_prompt};
use crate::core::Document;
use crate::error::RetrievalError;

/// Default coarse retrieval depth.
const DEFAULT_K: usize = 10;
/// Default reranked context size.
const DEFAULT_TOP_N: usize = 3;
/// Default per-stage deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A grounded answer and the documents it was generated from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalAnswer {
    /// Generated answer text.
    pub answer: String,
    /// Documents that survived reranking, best first.
    pub documents: Vec<Document>,
}

/// Coarse search, rerank/compression and grounded generation as one call.
#[derive(Clone)]
pub struct RetrievalPipeline {
    store: Arc<dyn DocumentStore>,
    reranker: Arc<dyn Reranker>,
    generator: ModelGateway,
    rag_template: String,
    k: usize,
    top_n: usize,
    timeout: Duration,
}

impl RetrievalPipeline {
    /// Creates a pipeline with K = 10, N = 3 and the built-in template.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        reranker: Arc<dyn Reranker>,
        generator: ModelGateway,
    ) -> Self {
        Self {
            store,
            reranker,
            generator,
            rag_template: RAG_TEMPLATE.to_string(),
            k: DEFAULT_K,
            top_n: DEFAULT_TOP_N,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the coarse depth and the number of documents kept by reranking.
    #[must_use]
    pub const fn with_limits(mut self, k: usize, top_n: usize) -> Self {
        self.k = k;
        self.top_n = top_n;
        self
    }

    /// Replaces the generation template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.rag_template = template.into();
        self
    }

    /// Sets the deadline applied to the search and rerank stages.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs coarse retrieval and reranking only.
    ///
    /// Deterministic for an unchanged store and reranker. The result holds
    /// at most `top_n` documents, each drawn from the coarse candidates.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's [`RetrievalError`].
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Document>, RetrievalError> {
        let candidates = bounded(self.timeout, self.store.search(question, self.k), |secs| {
            RetrievalError::DocumentStore {
                message: format!("{} search timed out after {secs}s", self.store.name()),
            }
        })
        .await?;

        if candidates.is_empty() {
            debug!(store = self.store.name(), "coarse retrieval returned nothing");
            return Ok(Vec::new());
        }

        let reranked = bounded(
            self.timeout,
            self.reranker.rerank(question, &candidates, self.top_n),
            |secs| RetrievalError::Reranker {
                message: format!("{} rerank timed out after {secs}s", self.reranker.name()),
            },
        )
        .await?;

        let kept = retain_subset(&candidates, reranked, self.top_n);
        debug!(
            store = self.store.name(),
            reranker = self.reranker.name(),
            candidates = candidates.len(),
            kept = kept.len(),
            "retrieval complete"
        );
        Ok(kept)
    }

    /// Retrieves context and generates an answer grounded in it.
    ///
    /// When no document survives reranking the model is not called and the
    /// answer is a fixed "I don't know" statement.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's [`RetrievalError`].
    pub async fn answer(&self, question: &str) -> Result<RetrievalAnswer, RetrievalError> {
        let documents = self.retrieve(question).await?;

        if documents.is_empty() {
            info!("no supporting documents, skipping generation");
            return Ok(RetrievalAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                documents,
            });
        }

        let context = build_context(&documents);
        let prompt = render_rag_prompt(&self.rag_template, question, &context);
        let response = self
            .generator
            .complete(&[user_message(&prompt)])
            .await
            .map_err(RetrievalError::Generation)?;

        Ok(RetrievalAnswer {
            answer: response.content,
            documents,
        })
    }
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("store", &self.store.name())
            .field("reranker", &self.reranker.name())
            .field("generator", &self.generator)
            .field("k", &self.k)
            .field("top_n", &self.top_n)
            .finish_non_exhaustive()
    }
}

/// Awaits `future`, mapping an elapsed deadline through `on_timeout`.
async fn bounded<T, F>(
    timeout: Duration,
    future: F,
    on_timeout: impl FnOnce(u64) -> RetrievalError,
) -> Result<T, RetrievalError>
where
    F: Future<Output = Result<T, RetrievalError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| on_timeout(timeout.as_secs()))?
}

/// Keeps reranked documents that were among the candidates, once each, up
/// to `top_n`.
fn retain_subset(candidates: &[Document], reranked: Vec<Document>, top_n: usize) -> Vec<Document> {
    let mut kept: Vec<Document> = Vec::with_capacity(top_n.min(reranked.len()));
    for doc in reranked {
        if kept.len() == top_n {
            break;
        }
        let known = candidates.iter().any(|c| c.same_chunk(&doc));
        let repeated = kept.iter().any(|k| k.same_chunk(&doc));
        if known && !repeated {
            kept.push(doc);
        }
    }
    kept
}
