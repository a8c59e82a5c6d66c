//! Policy Q&A: the retrieval pipeline exposed as a tool.

use std::fmt::Write;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::agent::tool::{ToolDefinition, ToolOutput};
use crate::error::ToolError;
use crate::retrieval::RetrievalPipeline;

/// Tool name advertised to the model.
pub const NAME: &str = "policy_qa";

const DESCRIPTION: &str = "Useful for when you need to answer questions about foster care \
policies. Searches the indexed policy documents and answers from them only, citing source and \
page. Input should be a fully formed question.";

/// Arguments for [`PolicyQaTool`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PolicyQaArgs {
    /// A fully formed question about foster care policy.
    pub question: String,
}

impl PolicyQaArgs {
    /// Rejects blank questions.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("`question` must not be empty".to_string());
        }
        Ok(())
    }
}

/// Answers policy questions through the retrieval pipeline.
#[derive(Debug, Clone)]
pub struct PolicyQaTool {
    pipeline: Arc<RetrievalPipeline>,
}

impl PolicyQaTool {
    /// Wraps a pipeline.
    #[must_use]
    pub const fn new(pipeline: Arc<RetrievalPipeline>) -> Self {
        Self { pipeline }
    }

    /// Definition advertised to the model.
    #[must_use]
    pub fn definition() -> ToolDefinition {
        ToolDefinition::for_args::<PolicyQaArgs>(NAME, DESCRIPTION)
    }

    /// Runs the pipeline and returns the answer plus its documents.
    ///
    /// The text lists the sources after the answer so the model can cite
    /// them in its final response.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Retrieval`] if any pipeline stage fails.
    pub async fn execute(&self, args: PolicyQaArgs) -> Result<ToolOutput, ToolError> {
        let result = self.pipeline.answer(&args.question).await?;

        let mut content = result.answer;
        if !result.documents.is_empty() {
            content.push_str("\n\nSources:");
            for doc in &result.documents {
                let _ = write!(content, "\n- {}", doc.citation());
            }
        }

        Ok(ToolOutput {
            content,
            documents: result.documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_schema() {
        let def = PolicyQaTool::definition();
        assert_eq!(def.name, "policy_qa");
        assert!(def.description.contains("foster care"));
        assert_eq!(def.parameters["required"], serde_json::json!(["question"]));
        assert_eq!(def.parameters["properties"]["question"]["type"], "string");
    }

    #[test]
    fn test_args_reject_unknown_fields() {
        let parsed: Result<PolicyQaArgs, _> =
            serde_json::from_str(r#"{"question": "q", "extra": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_args_validate() {
        let blank = PolicyQaArgs {
            question: "  ".to_string(),
        };
        assert!(blank.validate().is_err());
        let ok = PolicyQaArgs {
            question: "What is ASFA?".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
