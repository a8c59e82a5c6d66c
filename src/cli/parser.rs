//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Policy agent: answers foster care policy questions from retrieved,
/// reranked policy documents, with optional web search.
#[derive(Parser, Debug)]
#[command(name = "policy-agent")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory of `.txt`/`.md` policy documents for the in-memory index.
    ///
    /// Ignored when `QDRANT_URL` is set.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory containing prompt template files.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the agent a question.
    ///
    /// Runs the full tool-calling conversation. Requires an
    /// OpenAI-compatible API key.
    #[command(after_help = r#"Examples:
  policy-agent ask "How often are permanency hearings held?"
  policy-agent --data-dir ./policies ask "What is kinship care?" --show-context
  policy-agent ask "Any ICPC changes this year?" --directive "Web search is authorized."
  policy-agent --format json ask "What does ASFA require?" | jq .answer
"#)]
    Ask {
        /// The question to ask.
        message: String,

        /// Developer directive added as a system message (e.g. to
        /// authorize web search).
        #[arg(short, long)]
        directive: Option<String>,

        /// Maximum model turns before aborting.
        #[arg(long)]
        max_turns: Option<usize>,

        /// Print the retrieved documents after the answer.
        #[arg(long)]
        show_context: bool,
    },

    /// Retrieve and rerank policy documents without generating an answer.
    #[command(after_help = r#"Examples:
  policy-agent --data-dir ./policies retrieve "case plan deadlines"
  policy-agent --format json retrieve "reunification services" | jq '.[].source'
"#)]
    Retrieve {
        /// The question to retrieve documents for.
        question: String,
    },

    /// Start the HTTP API server.
    #[cfg(feature = "server")]
    #[command(after_help = r#"Examples:
  policy-agent serve                         # Listen on 0.0.0.0:8000
  policy-agent serve --host 127.0.0.1 --port 9000
"#)]
    Serve {
        /// Host to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Write the default prompt templates to a directory.
    ///
    /// Existing files are left untouched.
    InitPrompts {
        /// Target directory (defaults to `~/.config/policy-agent/prompts`).
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_flags() {
        let cli = Cli::try_parse_from([
            "policy-agent",
            "--format",
            "json",
            "ask",
            "What is ASFA?",
            "--directive",
            "Web search is authorized.",
            "--max-turns",
            "4",
            "--show-context",
        ])
        .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Ask {
                message,
                directive,
                max_turns,
                show_context,
            } => {
                assert_eq!(message, "What is ASFA?");
                assert_eq!(directive.as_deref(), Some("Web search is authorized."));
                assert_eq!(max_turns, Some(4));
                assert!(show_context);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "policy-agent",
            "retrieve",
            "case plans",
            "--data-dir",
            "/tmp/policies",
            "--verbose",
        ])
        .unwrap_or_else(|e| unreachable!("{e}"));
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/policies")));
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["policy-agent", "serve"])
            .unwrap_or_else(|e| unreachable!("{e}"));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8000);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }
}
