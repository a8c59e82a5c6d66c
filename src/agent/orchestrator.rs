//! Conversation orchestrator.
//!
//! Drives the model ↔ tool round-trip as an explicit state machine:
//!
//! ```text
//! Start → ModelTurn → (ToolTurn → ModelTurn)* → Done
//! ```
//!
//! The transition out of a model turn depends only on whether the last
//! assistant message requests tools (see [`next_phase`]). Tool failures
//! are appended as `Error: ...` tool messages and the loop continues;
//! model failures end the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::client::create_provider;
use super::config::AgentConfig;
use super::gateway::ModelGateway;
use super::message::{ChatMessage, TokenUsage, system_message, tool_message, user_message};
use super::observer::{NoopObserver, TurnKind, TurnObserver, TurnUpdate};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::registry::ToolRegistry;
use super::state::AgentState;
use crate::error::AgentError;
use crate::retrieval::build_pipeline;
use crate::tools::{PolicyQaTool, WebSearchTool};

/// Maximum byte length of a user message.
const MAX_USER_MESSAGE_LEN: usize = 10_000;

/// Input that starts a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSeed {
    /// The user's question.
    pub user_message: String,
    /// Optional directive appended as a system message before the user
    /// message. This is where web search gets authorized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
}

impl ConversationSeed {
    /// Seed with a user message only.
    #[must_use]
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            developer_message: None,
        }
    }

    /// Adds a developer directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.developer_message = Some(directive.into());
        self
    }

    fn validate(&self) -> Result<(), AgentError> {
        if self.user_message.trim().is_empty() {
            return Err(AgentError::InvalidRequest {
                message: "user message cannot be empty".to_string(),
            });
        }
        if self.user_message.len() > MAX_USER_MESSAGE_LEN {
            return Err(AgentError::InvalidRequest {
                message: format!(
                    "user message exceeds maximum length ({} bytes, max {MAX_USER_MESSAGE_LEN})",
                    self.user_message.len()
                ),
            });
        }
        Ok(())
    }
}

/// Phase of the conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Seeding the transcript.
    Start,
    /// Calling the model.
    ModelTurn,
    /// Dispatching the tool calls of the last assistant message.
    ToolTurn,
    /// Final answer produced.
    Done,
}

/// Pure transition function of the state machine.
///
/// After a model turn, an assistant message with tool calls leads to a
/// tool turn; anything else terminates.
#[must_use]
pub fn next_phase(phase: Phase, last_message: Option<&ChatMessage>) -> Phase {
    match phase {
        Phase::Start | Phase::ToolTurn => Phase::ModelTurn,
        Phase::ModelTurn if last_message.is_some_and(ChatMessage::requests_tools) => {
            Phase::ToolTurn
        }
        Phase::ModelTurn | Phase::Done => Phase::Done,
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Content of the final assistant message.
    pub answer: String,
    /// Full transcript and retrieved context.
    pub state: AgentState,
    /// Model turns taken.
    pub turns: usize,
    /// Token usage summed over conversation model calls.
    pub usage: TokenUsage,
}

/// Coordinates the model gateway and the tool registry across turns.
///
/// Holds only shared, read-only collaborators; every run owns its own
/// [`AgentState`], so one orchestrator serves concurrent runs.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    gateway: ModelGateway,
    registry: Arc<ToolRegistry>,
    prompts: PromptSet,
    max_turns: usize,
}

impl Orchestrator {
    /// Creates an orchestrator, binding the registry's tool definitions to
    /// the gateway.
    #[must_use]
    pub fn new(
        gateway: ModelGateway,
        registry: Arc<ToolRegistry>,
        prompts: PromptSet,
        max_turns: usize,
    ) -> Self {
        let gateway = gateway.with_tools(registry.definitions());
        Self {
            gateway,
            registry,
            prompts,
            max_turns: max_turns.max(1),
        }
    }

    /// Wires every component from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the provider, document store, reranker or
    /// web search client cannot be built.
    pub async fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(config)?);
        let prompts = PromptSet::load(config.prompt_dir.as_deref());

        let pipeline = build_pipeline(config, Arc::clone(&provider), &prompts).await?;
        // Policy Q&A makes up to three bounded calls (search, rerank, generate).
        let registry = ToolRegistry::new(
            PolicyQaTool::new(Arc::new(pipeline)),
            WebSearchTool::from_config(config)?,
        )
        .with_timeout(config.timeout.saturating_mul(3));

        let gateway = ModelGateway::for_conversation(provider, config);
        Ok(Self::new(
            gateway,
            Arc::new(registry),
            prompts,
            config.max_turns,
        ))
    }

    /// Runs a conversation to completion.
    ///
    /// # Errors
    ///
    /// See [`run_with_observer`](Self::run_with_observer).
    pub async fn run(&self, seed: &ConversationSeed) -> Result<RunOutcome, AgentError> {
        self.run_with_observer(seed, &NoopObserver).await
    }

    /// Runs a conversation, reporting every completed turn to `observer`.
    ///
    /// # Errors
    ///
    /// - [`AgentError::InvalidRequest`] for an empty or oversized user
    ///   message (no model call is made).
    /// - [`AgentError::TurnLimitExceeded`] if the model still requests tools
    ///   after `max_turns` model turns.
    /// - Any model gateway error, unchanged. No assistant message is
    ///   emitted for the failed turn.
    pub async fn run_with_observer(
        &self,
        seed: &ConversationSeed,
        observer: &dyn TurnObserver,
    ) -> Result<RunOutcome, AgentError> {
        seed.validate()?;

        let mut state = AgentState::new();
        let mut phase = Phase::Start;
        let mut turns = 0;
        let mut usage = TokenUsage::default();

        info!(
            model = self.gateway.model(),
            directive = seed.developer_message.is_some(),
            "conversation started"
        );

        loop {
            match phase {
                Phase::Start => self.seed(&mut state, seed),
                Phase::ModelTurn => {
                    turns += 1;
                    let response = self.gateway.complete(state.messages()).await?;
                    usage.accumulate(response.usage);
                    let message = response.into_message();
                    debug!(
                        turn = turns,
                        tool_calls = message.tool_calls.len(),
                        "model turn complete"
                    );
                    observer.on_turn(&TurnUpdate {
                        turn: turns,
                        kind: TurnKind::Model,
                        messages: vec![message.clone()],
                    });
                    state.push_message(message);
                }
                Phase::ToolTurn => {
                    if turns >= self.max_turns {
                        warn!(max_turns = self.max_turns, "turn limit reached");
                        return Err(AgentError::TurnLimitExceeded {
                            max_turns: self.max_turns,
                        });
                    }
                    let appended = self.dispatch_tools(&mut state).await;
                    observer.on_turn(&TurnUpdate {
                        turn: turns,
                        kind: TurnKind::Tool,
                        messages: appended,
                    });
                }
                Phase::Done => break,
            }
            phase = next_phase(phase, state.last_message());
        }

        let answer = state
            .last_message()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        info!(
            turns,
            context_documents = state.context().len(),
            total_tokens = usage.total_tokens,
            "conversation complete"
        );

        Ok(RunOutcome {
            answer,
            state,
            turns,
            usage,
        })
    }

    /// Appends the system instruction, the optional directive and the
    /// user message.
    fn seed(&self, state: &mut AgentState, seed: &ConversationSeed) {
        state.push_message(system_message(&self.prompts.system));
        if let Some(ref directive) = seed.developer_message {
            state.push_message(system_message(directive));
        }
        state.push_message(user_message(&seed.user_message));
    }

    /// Dispatches the last assistant message's tool calls in order and
    /// returns the tool messages appended.
    async fn dispatch_tools(&self, state: &mut AgentState) -> Vec<ChatMessage> {
        let calls = state
            .last_message()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        let mut appended = Vec::with_capacity(calls.len());
        for call in &calls {
            let content = match self.registry.dispatch(call).await {
                Ok(output) => {
                    let added = state.merge_context(output.documents);
                    debug!(
                        tool = %call.name,
                        call_id = %call.id,
                        context_added = added,
                        "tool call complete"
                    );
                    output.content
                }
                Err(e) => {
                    warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                    format!("Error: {e}")
                }
            };
            let message = tool_message(&call.id, &content);
            appended.push(message.clone());
            state.push_message(message);
        }
        appended
    }
}
