//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and
//! outputs. Input schemas are derived from the typed argument structs so
//! the schema the model sees and the validation at dispatch cannot drift.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::Document;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a variant of the tool registry).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Builds a definition whose parameter schema is generated from `T`.
    #[must_use]
    pub fn for_args<T: JsonSchema>(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: parameters_schema::<T>(),
        }
    }
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// What a successful tool execution hands back to the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text appended to the transcript as the tool-result message.
    pub content: String,
    /// Documents produced by the tool (empty for non-retrieval tools).
    pub documents: Vec<Document>,
}

impl ToolOutput {
    /// Output with text only.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            documents: Vec::new(),
        }
    }
}

/// Generates the JSON Schema object for a tool argument struct.
///
/// Drops the `$schema` and `title` keys, which function-calling APIs do
/// not expect at the top level.
fn parameters_schema<T: JsonSchema>() -> serde_json::Value {
    let mut value = schemars::schema_for!(T).to_value();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Example arguments.
    #[derive(Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    #[allow(dead_code)]
    struct ExampleArgs {
        /// The query.
        query: String,
        /// Optional limit.
        limit: Option<u32>,
    }

    #[test]
    fn test_for_args_schema() {
        let def = ToolDefinition::for_args::<ExampleArgs>("example", "An example tool.");
        assert_eq!(def.name, "example");
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters["properties"]["query"].is_object());
        assert_eq!(def.parameters["required"], serde_json::json!(["query"]));
        assert_eq!(def.parameters["additionalProperties"], false);
        assert!(def.parameters.get("$schema").is_none());
        assert!(def.parameters.get("title").is_none());
    }

    #[test]
    fn test_tool_call_serialization() {
        let call = ToolCall {
            id: "call_123".to_string(),
            name: "policy_qa".to_string(),
            arguments: r#"{"question":"What is concurrent planning?"}"#.to_string(),
        };
        let json = serde_json::to_string(&call).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(json.contains("policy_qa"));
    }

    #[test]
    fn test_tool_output_text() {
        let out = ToolOutput::text("ok");
        assert_eq!(out.content, "ok");
        assert!(out.documents.is_empty());
    }
}
