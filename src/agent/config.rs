//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The resulting [`AgentConfig`] is built once at startup and passed
//! explicitly to every component that needs it.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default chat model for the conversation loop.
const DEFAULT_MODEL: &str = "gpt-4.1";
/// Default model for grounded generation inside the retrieval pipeline.
const DEFAULT_RAG_MODEL: &str = "gpt-4.1-nano";
/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default reranking model.
const DEFAULT_RERANK_MODEL: &str = "rerank-v3.5";
/// Default Qdrant collection name.
const DEFAULT_QDRANT_COLLECTION: &str = "FosterCarePolicies";
/// Default max tokens for a conversation turn.
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default max tokens for grounded generation.
const DEFAULT_RAG_MAX_TOKENS: u32 = 2048;
/// Default timeout per external call in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default maximum model turns per conversation.
const DEFAULT_MAX_TURNS: usize = 10;
/// Default coarse retrieval depth.
const DEFAULT_RETRIEVAL_K: usize = 10;
/// Default number of documents kept by the reranker.
const DEFAULT_RERANK_TOP_N: usize = 3;
/// Default web search result count.
const DEFAULT_WEB_SEARCH_MAX_RESULTS: usize = 5;
/// Default request tag attached to every model call.
const DEFAULT_REQUEST_TAG: &str = "Foster research agent";

/// Which embedder backs the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedderKind {
    /// `OpenAI` embeddings API.
    #[default]
    OpenAi,
    /// Deterministic local feature hashing (offline use and tests).
    Hash,
}

impl EmbedderKind {
    /// Parses an embedder name (case-insensitive), defaulting to `OpenAi`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hash" => Self::Hash,
            _ => Self::OpenAi,
        }
    }
}

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model driving the conversation loop.
    pub model: String,
    /// Model used for grounded generation in the retrieval pipeline.
    pub rag_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Embedder backend.
    pub embedder: EmbedderKind,
    /// Maximum tokens per conversation turn.
    pub max_tokens: u32,
    /// Maximum tokens for grounded generation.
    pub rag_max_tokens: u32,
    /// Deadline applied to every external call.
    pub timeout: Duration,
    /// Maximum model turns before a run is aborted.
    pub max_turns: usize,
    /// Coarse retrieval depth (K).
    pub retrieval_k: usize,
    /// Documents kept after reranking (N).
    pub rerank_top_n: usize,
    /// Reranking model.
    pub rerank_model: String,
    /// Web search result count.
    pub web_search_max_results: usize,
    /// Cohere API key; without it the local lexical reranker is used.
    pub cohere_api_key: Option<String>,
    /// Tavily API key; without it web search calls fail as tool errors.
    pub tavily_api_key: Option<String>,
    /// Qdrant base URL; without it documents are indexed in memory.
    pub qdrant_url: Option<String>,
    /// Qdrant API key.
    pub qdrant_api_key: Option<String>,
    /// Qdrant collection name.
    pub qdrant_collection: String,
    /// Directory of `.txt`/`.md` policy documents for the in-memory index.
    pub data_dir: Option<PathBuf>,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Tags attached to every model call for tracing.
    pub request_tags: Vec<String>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    rag_model: Option<String>,
    embedding_model: Option<String>,
    embedder: Option<EmbedderKind>,
    max_tokens: Option<u32>,
    rag_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    max_turns: Option<usize>,
    retrieval_k: Option<usize>,
    rerank_top_n: Option<usize>,
    rerank_model: Option<String>,
    web_search_max_results: Option<usize>,
    cohere_api_key: Option<String>,
    tavily_api_key: Option<String>,
    qdrant_url: Option<String>,
    qdrant_api_key: Option<String>,
    qdrant_collection: Option<String>,
    data_dir: Option<PathBuf>,
    prompt_dir: Option<PathBuf>,
    request_tags: Option<Vec<String>>,
}

/// Reads an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads and parses an environment variable, ignoring unparsable values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = env_var("POLICY_AGENT_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = env_var("OPENAI_API_KEY");
        }
        if self.base_url.is_none() {
            self.base_url = env_var("OPENAI_BASE_URL");
        }
        if self.model.is_none() {
            self.model = env_var("POLICY_AGENT_MODEL");
        }
        if self.rag_model.is_none() {
            self.rag_model = env_var("POLICY_AGENT_RAG_MODEL");
        }
        if self.embedding_model.is_none() {
            self.embedding_model = env_var("POLICY_AGENT_EMBEDDING_MODEL");
        }
        if self.embedder.is_none() {
            self.embedder = env_var("POLICY_AGENT_EMBEDDER").map(|v| EmbedderKind::parse(&v));
        }
        if self.timeout.is_none() {
            self.timeout = env_parse("POLICY_AGENT_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.max_turns.is_none() {
            self.max_turns = env_parse("POLICY_AGENT_MAX_TURNS");
        }
        if self.retrieval_k.is_none() {
            self.retrieval_k = env_parse("POLICY_AGENT_RETRIEVAL_K");
        }
        if self.rerank_top_n.is_none() {
            self.rerank_top_n = env_parse("POLICY_AGENT_RERANK_TOP_N");
        }
        if self.cohere_api_key.is_none() {
            self.cohere_api_key = env_var("COHERE_API_KEY");
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = env_var("TAVILY_API_KEY");
        }
        if self.qdrant_url.is_none() {
            self.qdrant_url = env_var("QDRANT_URL");
        }
        if self.qdrant_api_key.is_none() {
            self.qdrant_api_key = env_var("QDRANT_API_KEY");
        }
        if self.qdrant_collection.is_none() {
            self.qdrant_collection = env_var("QDRANT_COLLECTION");
        }
        if self.data_dir.is_none() {
            self.data_dir = env_var("POLICY_AGENT_DATA_DIR").map(PathBuf::from);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = env_var("POLICY_AGENT_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the conversation model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the grounded-generation model.
    #[must_use]
    pub fn rag_model(mut self, model: impl Into<String>) -> Self {
        self.rag_model = Some(model.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets the embedder backend.
    #[must_use]
    pub const fn embedder(mut self, kind: EmbedderKind) -> Self {
        self.embedder = Some(kind);
        self
    }

    /// Sets the per-turn max tokens.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the grounded-generation max tokens.
    #[must_use]
    pub const fn rag_max_tokens(mut self, n: u32) -> Self {
        self.rag_max_tokens = Some(n);
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the maximum model turns per conversation.
    #[must_use]
    pub const fn max_turns(mut self, n: usize) -> Self {
        self.max_turns = Some(n);
        self
    }

    /// Sets the coarse retrieval depth.
    #[must_use]
    pub const fn retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = Some(k);
        self
    }

    /// Sets how many documents survive reranking.
    #[must_use]
    pub const fn rerank_top_n(mut self, n: usize) -> Self {
        self.rerank_top_n = Some(n);
        self
    }

    /// Sets the reranking model.
    #[must_use]
    pub fn rerank_model(mut self, model: impl Into<String>) -> Self {
        self.rerank_model = Some(model.into());
        self
    }

    /// Sets the web search result count.
    #[must_use]
    pub const fn web_search_max_results(mut self, n: usize) -> Self {
        self.web_search_max_results = Some(n);
        self
    }

    /// Sets the Cohere API key.
    #[must_use]
    pub fn cohere_api_key(mut self, key: impl Into<String>) -> Self {
        self.cohere_api_key = Some(key.into());
        self
    }

    /// Sets the Tavily API key.
    #[must_use]
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Sets the Qdrant base URL.
    #[must_use]
    pub fn qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.qdrant_url = Some(url.into());
        self
    }

    /// Sets the Qdrant collection.
    #[must_use]
    pub fn qdrant_collection(mut self, name: impl Into<String>) -> Self {
        self.qdrant_collection = Some(name.into());
        self
    }

    /// Sets the in-memory index data directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the request tags attached to model calls.
    #[must_use]
    pub fn request_tags(mut self, tags: Vec<String>) -> Self {
        self.request_tags = Some(tags);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::Configuration`] if a numeric bound or the timeout is zero.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        let max_turns = self.max_turns.unwrap_or(DEFAULT_MAX_TURNS);
        let retrieval_k = self.retrieval_k.unwrap_or(DEFAULT_RETRIEVAL_K);
        let rerank_top_n = self.rerank_top_n.unwrap_or(DEFAULT_RERANK_TOP_N);
        let web_search_max_results = self
            .web_search_max_results
            .unwrap_or(DEFAULT_WEB_SEARCH_MAX_RESULTS);
        for (name, value) in [
            ("max_turns", max_turns),
            ("retrieval_k", retrieval_k),
            ("rerank_top_n", rerank_top_n),
            ("web_search_max_results", web_search_max_results),
        ] {
            if value == 0 {
                return Err(AgentError::Configuration {
                    message: format!("{name} must be at least 1"),
                });
            }
        }

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            return Err(AgentError::Configuration {
                message: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            rag_model: self
                .rag_model
                .unwrap_or_else(|| DEFAULT_RAG_MODEL.to_string()),
            embedding_model: self
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedder: self.embedder.unwrap_or_default(),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            rag_max_tokens: self.rag_max_tokens.unwrap_or(DEFAULT_RAG_MAX_TOKENS),
            timeout,
            max_turns,
            retrieval_k,
            rerank_top_n,
            rerank_model: self
                .rerank_model
                .unwrap_or_else(|| DEFAULT_RERANK_MODEL.to_string()),
            web_search_max_results,
            cohere_api_key: self.cohere_api_key,
            tavily_api_key: self.tavily_api_key,
            qdrant_url: self.qdrant_url,
            qdrant_api_key: self.qdrant_api_key,
            qdrant_collection: self
                .qdrant_collection
                .unwrap_or_else(|| DEFAULT_QDRANT_COLLECTION.to_string()),
            data_dir: self.data_dir,
            prompt_dir: self.prompt_dir,
            request_tags: self
                .request_tags
                .unwrap_or_else(|| vec![DEFAULT_REQUEST_TAG.to_string()]),
        })
    }
}
