//! Qdrant-backed document store over the REST API.
//!
//! Points are expected in the layout written by common RAG loaders: the
//! chunk text under `page_content` and provenance under
//! `metadata.source` / `metadata.page`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::embedding::Embedder;
use super::store::DocumentStore;
use crate::agent::config::AgentConfig;
use crate::core::Document;
use crate::error::{AgentError, RetrievalError};

/// Document store backed by a Qdrant collection.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    embedder: Arc<dyn Embedder>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    page_content: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

impl QdrantStore {
    /// Creates a store for the given base URL using the configured
    /// collection, API key and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        config: &AgentConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Configuration {
                message: format!("failed to build Qdrant HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: config.qdrant_collection.clone(),
            api_key: config.qdrant_api_key.clone(),
            embedder,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        )
    }

    /// Maps search hits to documents, skipping points without text.
    fn into_documents(response: SearchResponse) -> Vec<Document> {
        response
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload.unwrap_or_default();
                let Some(content) = payload.page_content else {
                    warn!("skipping Qdrant point without page_content");
                    return None;
                };
                let source = payload
                    .metadata
                    .source
                    .unwrap_or_else(|| "unknown".to_string());
                Some(Document::new(content, source, payload.metadata.page).with_score(point.score))
            })
            .collect()
    }
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for QdrantStore {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError> {
        let vector = self.embedder.embed_query(query).await?;

        let mut request = self.client.post(self.search_url()).json(&SearchRequest {
            vector: &vector,
            limit: k,
            with_payload: true,
        });
        if let Some(ref key) = self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::DocumentStore {
                message: format!("Qdrant request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::DocumentStore {
                message: format!("Qdrant returned {status}: {body}"),
            });
        }

        let parsed: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::DocumentStore {
                    message: format!("invalid Qdrant response: {e}"),
                })?;

        let documents = Self::into_documents(parsed);
        debug!(
            collection = %self.collection,
            hits = documents.len(),
            "qdrant search complete"
        );
        Ok(documents)
    }
}
