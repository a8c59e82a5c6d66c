//! Web search through the Tavily search API.
//!
//! The tool is always registered so the advertised schemas never change;
//! without a Tavily key every call fails as a tool error the model can
//! read and recover from.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::tool::{ToolDefinition, ToolOutput};
use crate::error::{AgentError, ToolError};

/// Tool name advertised to the model.
pub const NAME: &str = "web_search";

const DESCRIPTION: &str = "Search the web for recent foster care policy news and updates. \
Returns a list of results with titles, URLs and content. Only use when the latest system \
directive explicitly authorizes web search.";

/// Search endpoint.
const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Arguments for [`WebSearchTool`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebSearchArgs {
    /// The search query.
    pub query: String,
}

impl WebSearchArgs {
    /// Rejects blank queries.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("`query` must not be empty".to_string());
        }
        Ok(())
    }
}

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Extracted content snippet.
    pub content: String,
}

/// Web search backend.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Returns up to `max_results` hits for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] on backend failure.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, ToolError>;
}

/// Tavily search API client.
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl From<TavilyResult> for SearchResult {
    fn from(r: TavilyResult) -> Self {
        Self {
            title: r.title,
            url: r.url,
            content: r.content,
        }
    }
}

impl TavilyClient {
    /// Creates a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &AgentConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Configuration {
                message: format!("failed to build Tavily HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
        })
    }

    fn error(message: String) -> ToolError {
        ToolError::Execution {
            name: NAME.to_string(),
            message,
        }
    }
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WebSearcher for TavilyClient {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ToolError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest { query, max_results })
            .send()
            .await
            .map_err(|e| Self::error(format!("Tavily request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::error(format!("Tavily returned {status}: {text}")));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| Self::error(format!("invalid Tavily response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(SearchResult::from)
            .collect())
    }
}

/// Web search tool wrapping an optional backend.
#[derive(Clone)]
pub struct WebSearchTool {
    searcher: Option<Arc<dyn WebSearcher>>,
    max_results: usize,
}

impl WebSearchTool {
    /// Creates the tool. `None` keeps it registered but unusable.
    #[must_use]
    pub fn new(searcher: Option<Arc<dyn WebSearcher>>, max_results: usize) -> Self {
        Self {
            searcher,
            max_results: max_results.max(1),
        }
    }

    /// Builds the tool from configuration, using Tavily when a key is set.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let searcher: Option<Arc<dyn WebSearcher>> = match config.tavily_api_key {
            Some(ref key) => Some(Arc::new(TavilyClient::new(key, config)?)),
            None => None,
        };
        Ok(Self::new(searcher, config.web_search_max_results))
    }

    /// Definition advertised to the model.
    #[must_use]
    pub fn definition() -> ToolDefinition {
        ToolDefinition::for_args::<WebSearchArgs>(NAME, DESCRIPTION)
    }

    /// Runs the search and returns the hits as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if no backend is configured or the
    /// backend fails.
    pub async fn execute(&self, args: WebSearchArgs) -> Result<ToolOutput, ToolError> {
        let Some(ref searcher) = self.searcher else {
            return Err(ToolError::Execution {
                name: NAME.to_string(),
                message: "web search is not configured (TAVILY_API_KEY is not set)".to_string(),
            });
        };

        let results = searcher.search(&args.query, self.max_results).await?;
        debug!(
            backend = searcher.name(),
            results = results.len(),
            "web search complete"
        );

        let content =
            serde_json::to_string_pretty(&results).map_err(|e| ToolError::Execution {
                name: NAME.to_string(),
                message: format!("serialization error: {e}"),
            })?;
        Ok(ToolOutput::text(content))
    }
}

impl std::fmt::Debug for WebSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchTool")
            .field("searcher", &self.searcher.as_ref().map(|s| s.name()))
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    struct FixedSearcher;

    #[async_trait]
    impl WebSearcher for FixedSearcher {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(
            &self,
            query: &str,
            max_results: usize,
        ) -> Result<Vec<SearchResult>, ToolError> {
            Ok((0..10)
                .map(|i| SearchResult {
                    title: format!("{query} {i}"),
                    url: format!("https://example.org/{i}"),
                    content: "snippet".to_string(),
                })
                .take(max_results)
                .collect())
        }
    }

    #[tokio::test]
    async fn test_execute_returns_pretty_json() {
        let tool = WebSearchTool::new(Some(Arc::new(FixedSearcher)), 5);
        let out = tool
            .execute(WebSearchArgs {
                query: "ICPC update".to_string(),
            })
            .await
            .unwrap_or_else(|e| panic!("execute failed: {e}"));

        let parsed: Vec<SearchResult> =
            serde_json::from_str(&out.content).unwrap_or_else(|e| panic!("not JSON: {e}"));
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0].title, "ICPC update 0");
        assert!(out.content.contains('\n'));
        assert!(out.documents.is_empty());
    }

    #[tokio::test]
    async fn test_execute_without_backend_fails() {
        let tool = WebSearchTool::new(None, 5);
        let result = tool
            .execute(WebSearchArgs {
                query: "q".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(ToolError::Execution { ref message, .. }) if message.contains("TAVILY_API_KEY")
        ));
    }

    #[test]
    fn test_tavily_response_mapping() {
        let parsed: TavilyResponse = serde_json::from_str(
            r#"{
                "query": "q",
                "results": [
                    {"title": "T", "url": "https://a.example", "content": "C", "score": 0.9},
                    {"url": "https://b.example"}
                ],
                "response_time": 1.2
            }"#,
        )
        .unwrap_or_else(|e| panic!("invalid fixture: {e}"));
        let results: Vec<SearchResult> =
            parsed.results.into_iter().map(SearchResult::from).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "T");
        assert_eq!(results[1].title, "");
    }

    #[test]
    fn test_definition_schema() {
        let def = WebSearchTool::definition();
        assert_eq!(def.name, "web_search");
        assert_eq!(def.parameters["required"], serde_json::json!(["query"]));
    }
}
