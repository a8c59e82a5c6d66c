//! Cohere rerank API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rerank::{Reranker, select};
use crate::agent::config::AgentConfig;
use crate::core::Document;
use crate::error::{AgentError, RetrievalError};

/// Rerank endpoint.
const COHERE_RERANK_URL: &str = "https://api.cohere.com/v2/rerank";

/// Reranker backed by Cohere's rerank models (`rerank-v3.5` by default).
pub struct CohereReranker {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    #[serde(default)]
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

impl CohereReranker {
    /// Creates a reranker with the configured model and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &AgentConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Configuration {
                message: format!("failed to build Cohere HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.rerank_model.clone(),
            endpoint: COHERE_RERANK_URL.to_string(),
        })
    }

    /// Overrides the rerank endpoint (for proxies).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn ranked(response: &RerankResponse) -> Vec<(usize, f32)> {
        response
            .results
            .iter()
            .map(|r| (r.index, r.relevance_score))
            .collect()
    }
}

impl std::fmt::Debug for CohereReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohereReranker")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    fn name(&self) -> &'static str {
        "cohere"
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[Document],
        top_n: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let body = RerankRequest {
            model: &self.model,
            query,
            documents: documents.iter().map(|d| d.content.as_str()).collect(),
            top_n: top_n.min(documents.len()),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Reranker {
                message: format!("Cohere request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Reranker {
                message: format!("Cohere returned {status}: {text}"),
            });
        }

        let parsed: RerankResponse =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::Reranker {
                    message: format!("invalid Cohere response: {e}"),
                })?;

        let kept = select(documents, &Self::ranked(&parsed), top_n);
        debug!(
            model = %self.model,
            candidates = documents.len(),
            kept = kept.len(),
            "cohere rerank complete"
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_mapping_keeps_order_and_scores() {
        let response: RerankResponse = serde_json::from_str(
            r#"{
                "id": "abc",
                "results": [
                    {"index": 2, "relevance_score": 0.93},
                    {"index": 0, "relevance_score": 0.41}
                ],
                "meta": {"api_version": {"version": "2"}}
            }"#,
        )
        .unwrap_or_else(|e| unreachable!("invalid fixture: {e}"));

        let documents = vec![
            Document::new("zero", "a.pdf", Some(1)),
            Document::new("one", "a.pdf", Some(2)),
            Document::new("two", "b.pdf", Some(9)),
        ];
        let kept = select(&documents, &CohereReranker::ranked(&response), 3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].content, "two");
        assert_eq!(kept[0].page, Some(9));
        assert_eq!(kept[0].score, Some(0.93));
        assert_eq!(kept[1].content, "zero");
    }

    #[test]
    fn test_request_serialization() {
        let body = RerankRequest {
            model: "rerank-v3.5",
            query: "q",
            documents: vec!["a", "b"],
            top_n: 2,
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["model"], "rerank-v3.5");
        assert_eq!(json["documents"], serde_json::json!(["a", "b"]));
        assert_eq!(json["top_n"], 2);
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_request() {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let reranker = CohereReranker::new("key", &config)
            .unwrap_or_else(|_| unreachable!())
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let out = reranker.rerank("q", &[], 3).await.unwrap_or_else(|_| unreachable!());
        assert!(out.is_empty());
    }
}
