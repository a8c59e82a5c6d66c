//! # policy-agent
//!
//! A tool-calling research agent for foster care policy questions.
//!
//! The agent runs a cyclic conversation: the model either answers or
//! requests tools, tool results are appended to the transcript, and the
//! loop continues until an answer arrives. Two tools are available:
//!
//! - `policy_qa`: retrieval-augmented answering over policy documents
//!   (vector search, reranking, grounded generation with citations).
//! - `web_search`: Tavily web search, used only when a developer directive
//!   authorizes it.
//!
//! ## Example
//!
//! ```no_run
//! use policy_agent::agent::{AgentConfig, ConversationSeed, Orchestrator};
//!
//! # async fn run() -> Result<(), policy_agent::error::AgentError> {
//! let config = AgentConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(&config).await?;
//! let outcome = orchestrator
//!     .run(&ConversationSeed::new("How often are permanency hearings held?"))
//!     .await?;
//! println!("{}", outcome.answer);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod retrieval;
#[cfg(feature = "server")]
pub mod server;
pub mod tools;

pub use error::{Error, Result};
