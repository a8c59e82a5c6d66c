//! CLI layer for policy-agent.
//!
//! Provides the command-line interface using clap, with commands for
//! asking the agent, running retrieval alone, serving the HTTP API and
//! writing the default prompts.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
