//! Error types for policy-agent.
//!
//! Errors are split by how far they are allowed to travel:
//!
//! - [`ToolError`] and [`RetrievalError`] stay inside the conversation loop.
//!   The orchestrator turns them into tool-result messages so the model can
//!   adapt.
//! - [`AgentError`] ends a run and is surfaced to the caller.
//! - [`CommandError`] and [`Error`] belong to the CLI and binary layer.

use thiserror::Error;

/// Result type alias for the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Agent run or configuration failure.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort an orchestrator run.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key was configured for the language model.
    #[error("API key missing: set OPENAI_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name has no implementation.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The provider name that was requested.
        name: String,
    },

    /// The language model API call failed (network, HTTP status, or API error).
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error details.
        message: String,
        /// HTTP status code, when known.
        status: Option<u16>,
    },

    /// A suspending call exceeded its deadline.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The deadline in seconds.
        secs: u64,
    },

    /// The model kept requesting tools past the configured bound.
    #[error("conversation exceeded maximum of {max_turns} model turns")]
    TurnLimitExceeded {
        /// The configured bound.
        max_turns: usize,
    },

    /// The incoming request cannot start a run.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// Startup wiring failed (missing data, bad settings).
    #[error("configuration error: {message}")]
    Configuration {
        /// Error details.
        message: String,
    },
}

/// Errors raised while dispatching a tool call.
///
/// All variants are recoverable: they become tool-result messages.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The model named a tool that is not registered.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },

    /// The model's arguments do not match the tool's input schema.
    #[error("invalid input for tool '{name}': {message}")]
    InvalidToolInput {
        /// Tool name.
        name: String,
        /// Validation failure details.
        message: String,
    },

    /// The retrieval pipeline failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The tool's backend failed.
    #[error("tool '{name}' failed: {message}")]
    Execution {
        /// Tool name.
        name: String,
        /// Failure details.
        message: String,
    },

    /// The tool did not finish within the configured deadline.
    #[error("tool '{name}' timed out after {secs}s")]
    Timeout {
        /// Tool name.
        name: String,
        /// The deadline in seconds.
        secs: u64,
    },
}

/// Errors raised by a stage of the retrieval pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding the query or documents failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Error details.
        message: String,
    },

    /// The document store was unreachable or returned an error.
    #[error("document store error: {message}")]
    DocumentStore {
        /// Error details.
        message: String,
    },

    /// The reranker was unreachable or returned an error.
    #[error("reranker error: {message}")]
    Reranker {
        /// Error details.
        message: String,
    },

    /// The grounded generation call failed.
    #[error("generation failed: {0}")]
    Generation(#[source] AgentError),
}

/// CLI command errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Output formatting failed.
    #[error("output format error: {0}")]
    OutputFormat(String),
}
