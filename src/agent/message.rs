//! Provider-agnostic message types for LLM communication.
//!
//! These types decouple the conversation loop from any specific LLM SDK.
//! A conversation is an append-only `Vec<ChatMessage>`; the constructors
//! below are the only way the crate builds messages.

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolDefinition};

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions and developer directives.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
    /// Tool result.
    Tool,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Tool calls requested by the assistant (only for `Role::Assistant`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool call ID this message responds to (only for `Role::Tool`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Returns `true` if this is an assistant message requesting tools.
    #[must_use]
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A chat completion request (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4.1").
    pub model: String,
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Tool definitions available to the model.
    pub tools: Vec<ToolDefinition>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Adds another usage record to this one, saturating on overflow.
    pub const fn accumulate(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// A chat completion response (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCall>,
    /// Finish reason from the model (e.g., `"stop"`, `"tool_calls"`).
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Converts the response into the assistant message to append.
    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        assistant_message(self.content, self.tool_calls)
    }
}

/// Creates a system message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::System,
        content: content.to_string(),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.to_string(),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

/// Creates an assistant message, optionally carrying tool calls.
#[must_use]
pub const fn assistant_message(content: String, tool_calls: Vec<ToolCall>) -> ChatMessage {
    ChatMessage {
        role: Role::Assistant,
        content,
        tool_calls,
        tool_call_id: None,
    }
}

/// Creates a tool result message.
#[must_use]
pub fn tool_message(tool_call_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::Tool,
        content: content.to_string(),
        tool_calls: Vec::new(),
        tool_call_id: Some(tool_call_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message() {
        let msg = system_message("You are helpful.");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "You are helpful.");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn test_tool_message() {
        let msg = tool_message("call_123", "result data");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.content, "result data");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_123"));
    }

    #[test]
    fn test_assistant_message_requests_tools() {
        let calls = vec![ToolCall {
            id: "call_1".to_string(),
            name: "policy_qa".to_string(),
            arguments: r#"{"question":"q"}"#.to_string(),
        }];
        let msg = assistant_message(String::new(), calls);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.requests_tools());

        let final_answer = assistant_message("done".to_string(), Vec::new());
        assert!(!final_answer.requests_tools());
    }

    #[test]
    fn test_response_into_message() {
        let response = ChatResponse {
            content: "answer".to_string(),
            usage: TokenUsage::default(),
            tool_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        };
        let msg = response.into_message();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "answer");
    }

    #[test]
    fn test_usage_accumulate() {
        let mut total = TokenUsage::default();
        total.accumulate(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.accumulate(TokenUsage {
            prompt_tokens: u32::MAX,
            completion_tokens: 1,
            total_tokens: 1,
        });
        assert_eq!(total.prompt_tokens, u32::MAX);
        assert_eq!(total.completion_tokens, 6);
        assert_eq!(total.total_tokens, 16);
    }

    #[test]
    fn test_chat_message_serialization() {
        let msg = user_message("test");
        let json = serde_json::to_string(&msg).unwrap_or_default();
        assert!(json.contains("\"user\""));
        assert!(json.contains("\"test\""));
        // tool_calls and tool_call_id should be omitted when empty/None
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
    }
}
