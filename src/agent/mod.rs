//! Tool-calling conversation agent.
//!
//! A run alternates model turns and tool turns until the model answers
//! without requesting tools. Providers are pluggable behind
//! [`LlmProvider`], backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! ConversationSeed → Orchestrator
//!   ├── Start: system prompt, optional directive, user message
//!   ├── ModelTurn: ModelGateway (temperature 0, tools bound)
//!   ├── ToolTurn: ToolRegistry::dispatch, in call order
//!   │   ├── policy_qa → RetrievalPipeline (search → rerank → generate)
//!   │   └── web_search → Tavily
//!   └── Done: final assistant content
//! ```

pub mod client;
pub mod config;
pub mod gateway;
pub mod message;
pub mod observer;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod state;
pub mod tool;

// Re-export key types
pub use config::{AgentConfig, EmbedderKind};
pub use gateway::ModelGateway;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use observer::{NoopObserver, TurnKind, TurnObserver, TurnUpdate};
pub use orchestrator::{ConversationSeed, Orchestrator, Phase, RunOutcome, next_phase};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use registry::{Tool, ToolRegistry};
pub use state::AgentState;
pub use tool::{ToolCall, ToolDefinition, ToolOutput};
