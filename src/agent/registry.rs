//! Closed tool set and dispatch.
//!
//! Maps tool names to the concrete tools. Arguments are parsed into the
//! same typed structs the advertised schemas are generated from, so a call
//! either matches its schema or fails with [`ToolError::InvalidToolInput`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::tool::{ToolCall, ToolDefinition, ToolOutput};
use crate::error::ToolError;
use crate::tools::{PolicyQaArgs, PolicyQaTool, WebSearchArgs, WebSearchTool, policy_qa, web_search};

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;
/// Default deadline for a single tool execution.
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// The tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Retrieval-augmented policy question answering.
    PolicyQa,
    /// Web search.
    WebSearch,
}

impl Tool {
    /// Every tool, in advertised order.
    pub const ALL: [Self; 2] = [Self::WebSearch, Self::PolicyQa];

    /// Name advertised to the model.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PolicyQa => policy_qa::NAME,
            Self::WebSearch => web_search::NAME,
        }
    }

    /// Looks a tool up by its advertised name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Definition advertised to the model.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        match self {
            Self::PolicyQa => PolicyQaTool::definition(),
            Self::WebSearch => WebSearchTool::definition(),
        }
    }
}

/// Dispatches tool calls to the registered tools.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    policy_qa: PolicyQaTool,
    web_search: WebSearchTool,
    timeout: Duration,
}

impl ToolRegistry {
    /// Creates a registry holding both tools.
    #[must_use]
    pub const fn new(policy_qa: PolicyQaTool, web_search: WebSearchTool) -> Self {
        Self {
            policy_qa,
            web_search,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Sets the deadline applied to each tool execution.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Definitions for every registered tool.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        Tool::ALL.into_iter().map(Tool::definition).collect()
    }

    /// Validates and executes one tool call.
    ///
    /// # Errors
    ///
    /// - [`ToolError::UnknownTool`] if the name is not registered.
    /// - [`ToolError::InvalidToolInput`] if the arguments are oversized,
    ///   malformed, do not match the schema, or are blank.
    /// - [`ToolError::Timeout`] if the tool exceeds its deadline.
    /// - The tool's own error otherwise.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let tool = Tool::from_name(&call.name).ok_or_else(|| ToolError::UnknownTool {
            name: call.name.clone(),
        })?;

        debug!(tool = tool.name(), call_id = %call.id, "dispatching tool call");

        let execution = async {
            match tool {
                Tool::PolicyQa => {
                    let args: PolicyQaArgs = parse_args(tool, &call.arguments)?;
                    args.validate().map_err(|message| invalid(tool, message))?;
                    self.policy_qa.execute(args).await
                }
                Tool::WebSearch => {
                    let args: WebSearchArgs = parse_args(tool, &call.arguments)?;
                    args.validate().map_err(|message| invalid(tool, message))?;
                    self.web_search.execute(args).await
                }
            }
        };

        tokio::time::timeout(self.timeout, execution)
            .await
            .map_err(|_| ToolError::Timeout {
                name: tool.name().to_string(),
                secs: self.timeout.as_secs(),
            })?
    }
}

fn invalid(tool: Tool, message: String) -> ToolError {
    ToolError::InvalidToolInput {
        name: tool.name().to_string(),
        message,
    }
}

/// Parses raw argument JSON into the tool's typed arguments.
///
/// An empty string is read as an empty object.
fn parse_args<T: DeserializeOwned>(tool: Tool, raw: &str) -> Result<T, ToolError> {
    if raw.len() > MAX_TOOL_ARGS_LEN {
        return Err(invalid(
            tool,
            format!(
                "arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                raw.len()
            ),
        ));
    }
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| invalid(tool, e.to_string()))
}
