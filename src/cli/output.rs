//! Output formatting for CLI commands.

#![allow(clippy::format_push_string)]

use std::fmt::Write as _;

use serde::Serialize;

use crate::agent::RunOutcome;
use crate::core::Document;

/// Maximum characters of document content shown in text output.
const PREVIEW_LEN: usize = 200;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, defaulting to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let mut json = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!(r#"{{"error": "serialization failed: {e}"}}"#));
        json.push('\n');
        json
    }
}

/// Formats the result of `ask`.
#[must_use]
pub fn format_outcome(outcome: &RunOutcome, show_context: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = outcome.answer.clone();
            output.push_str(&format!(
                "\n\n---\nTurns: {} | Context documents: {} | Tokens: {}\n",
                outcome.turns,
                outcome.state.context().len(),
                outcome.usage.total_tokens
            ));
            if show_context && !outcome.state.context().is_empty() {
                output.push_str("\nContext:\n");
                output.push_str(&format_document_list(outcome.state.context()));
            }
            output
        }
        OutputFormat::Json => {
            let mut value = serde_json::json!({
                "answer": outcome.answer,
                "turns": outcome.turns,
                "usage": outcome.usage,
            });
            if show_context {
                value["context"] = serde_json::json!(outcome.state.context());
            }
            format.to_json(&value)
        }
    }
}

/// Formats the result of `retrieve`.
#[must_use]
pub fn format_documents(documents: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text if documents.is_empty() => "No relevant documents found.\n".to_string(),
        OutputFormat::Text => format_document_list(documents),
        OutputFormat::Json => format.to_json(documents),
    }
}

fn format_document_list(documents: &[Document]) -> String {
    let mut output = String::new();
    for (i, doc) in documents.iter().enumerate() {
        let score = doc
            .score
            .map(|s| format!(" (score {s:.3})"))
            .unwrap_or_default();
        let _ = writeln!(output, "[{}] {}{score}", i + 1, doc.citation());
        let _ = writeln!(output, "    {}", preview(&doc.content));
    }
    output
}

/// First line-folded [`PREVIEW_LEN`] characters of `content`.
fn preview(content: &str) -> String {
    let folded: String = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if folded.chars().count() <= PREVIEW_LEN {
        return folded;
    }
    let mut cut: String = folded.chars().take(PREVIEW_LEN).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentState, TokenUsage};

    fn outcome() -> RunOutcome {
        let mut state = AgentState::new();
        state.merge_context(vec![
            Document::new("Hearings every twelve months.", "pub5108.txt", Some(2)).with_score(0.9),
        ]);
        RunOutcome {
            answer: "Every 12 months.".to_string(),
            state,
            turns: 2,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_outcome_text() {
        let text = format_outcome(&outcome(), false, OutputFormat::Text);
        assert!(text.starts_with("Every 12 months."));
        assert!(text.contains("Turns: 2"));
        assert!(!text.contains("pub5108.txt"));

        let text = format_outcome(&outcome(), true, OutputFormat::Text);
        assert!(text.contains("[1] pub5108.txt, page 2 (score 0.900)"));
    }

    #[test]
    fn test_outcome_json() {
        let json = format_outcome(&outcome(), true, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["answer"], "Every 12 months.");
        assert_eq!(value["usage"]["total_tokens"], 120);
        assert_eq!(value["context"][0]["source"], "pub5108.txt");
    }

    #[test]
    fn test_documents_empty() {
        assert_eq!(
            format_documents(&[], OutputFormat::Text),
            "No relevant documents found.\n"
        );
        assert_eq!(format_documents(&[], OutputFormat::Json), "[]\n");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(100);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_LEN + 3);
        assert_eq!(preview("a\n  b"), "a b");
    }
}
