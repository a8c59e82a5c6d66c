//! Deterministic model invocation.
//!
//! [`ModelGateway`] binds a model, its sampling settings and the tool
//! schemas to an [`LlmProvider`]. Every call runs at temperature 0 under
//! the configured deadline and is recorded on a `model_call` span carrying
//! the request tags.

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info_span};

use super::config::AgentConfig;
use super::message::{ChatMessage, ChatRequest, ChatResponse};
use super::provider::LlmProvider;
use super::tool::ToolDefinition;
use crate::error::AgentError;

/// Sampling temperature for every call.
const TEMPERATURE: f32 = 0.0;

/// Invokes the language model with fixed settings.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    tools: Vec<ToolDefinition>,
    tags: Vec<String>,
}

impl ModelGateway {
    /// Creates a gateway with no tools bound and no tags.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            timeout,
            tools: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Gateway for the conversation loop, tagged from config.
    #[must_use]
    pub fn for_conversation(provider: Arc<dyn LlmProvider>, config: &AgentConfig) -> Self {
        Self::new(provider, &config.model, config.max_tokens, config.timeout)
            .with_tags(config.request_tags.clone())
    }

    /// Gateway for grounded generation inside the retrieval pipeline.
    #[must_use]
    pub fn for_generation(provider: Arc<dyn LlmProvider>, config: &AgentConfig) -> Self {
        Self::new(provider, &config.rag_model, config.rag_max_tokens, config.timeout)
            .with_tags(config.request_tags.clone())
    }

    /// Binds tool definitions to every request.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the request tags recorded on each call.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Model identifier used for every call.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Tool definitions bound to every call.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Sends the full message list and returns the model's response.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] when the deadline passes, or the
    /// provider's error otherwise. Nothing is retried.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatResponse, AgentError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: Some(TEMPERATURE),
            max_tokens: Some(self.max_tokens),
            tools: self.tools.clone(),
        };

        let span = info_span!(
            "model_call",
            provider = self.provider.name(),
            model = %self.model,
            tags = ?self.tags,
            messages = messages.len(),
        );

        async {
            let response = tokio::time::timeout(self.timeout, self.provider.chat(&request))
                .await
                .map_err(|_| AgentError::Timeout {
                    operation: "model call",
                    secs: self.timeout.as_secs(),
                })??;
            debug!(
                tool_calls = response.tool_calls.len(),
                total_tokens = response.usage.total_tokens,
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "model call complete"
            );
            Ok::<_, AgentError>(response)
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("tools", &self.tools.len())
            .field("tags", &self.tags)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agent::message::{TokenUsage, user_message};

    /// Records each request and answers with a fixed text.
    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            Ok(ChatResponse {
                content: "ok".to_string(),
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    /// Never answers.
    struct StalledProvider;

    #[async_trait]
    impl LlmProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_complete_is_deterministic() {
        let provider = Arc::new(RecordingProvider::default());
        let tool = ToolDefinition {
            name: "policy_qa".to_string(),
            description: "d".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let gateway = ModelGateway::new(provider.clone(), "gpt-4.1", 512, Duration::from_secs(5))
            .with_tools(vec![tool]);

        let response = gateway
            .complete(&[user_message("hi")])
            .await
            .unwrap_or_else(|e| panic!("complete failed: {e}"));
        assert_eq!(response.content, "ok");

        let requests = provider.requests.lock().unwrap_or_else(|_| unreachable!());
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].model, "gpt-4.1");
        assert_eq!(requests[0].max_tokens, Some(512));
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_times_out() {
        let gateway = ModelGateway::new(
            Arc::new(StalledProvider),
            "gpt-4.1",
            512,
            Duration::from_secs(3),
        );
        let result = gateway.complete(&[user_message("hi")]).await;
        assert!(matches!(
            result,
            Err(AgentError::Timeout {
                operation: "model call",
                secs: 3
            })
        ));
    }
}
