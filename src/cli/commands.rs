//! CLI command implementations.
//!
//! Each command builds the configuration once, wires the components it
//! needs and bridges into async code through its own tokio runtime.

#![allow(clippy::format_push_string)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::agent::client::create_provider;
use crate::agent::{
    AgentConfig, ConversationSeed, LlmProvider, Orchestrator, PromptSet, TurnUpdate,
};
use crate::cli::output::{OutputFormat, format_documents, format_outcome};
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Error, Result};
use crate::retrieval::build_pipeline;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask {
            message,
            directive,
            max_turns,
            show_context,
        } => {
            let config = load_config(cli, *max_turns)?;
            let mut seed = ConversationSeed::new(message.as_str());
            if let Some(directive) = directive {
                seed = seed.with_directive(directive.as_str());
            }
            cmd_ask(&config, &seed, *show_context, cli.verbose, format)
        }
        Commands::Retrieve { question } => {
            let config = load_config(cli, None)?;
            cmd_retrieve(&config, question, format)
        }
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            let config = load_config(cli, None)?;
            cmd_serve(&config, host, *port)
        }
        Commands::InitPrompts { dir } => {
            cmd_init_prompts(dir.as_deref().or(cli.prompt_dir.as_deref()), format)
        }
    }
}

/// Builds the agent configuration from env + CLI overrides.
fn load_config(cli: &Cli, max_turns: Option<usize>) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(ref dir) = cli.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(ref dir) = cli.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(n) = max_turns {
        builder = builder.max_turns(n);
    }

    let config = builder.build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })?;
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;
    Ok(rt)
}

/// Logs a completed turn; used as the `ask` observer under `--verbose`.
fn log_turn(update: &TurnUpdate) {
    for message in &update.messages {
        let tools: Vec<&str> = message.tool_calls.iter().map(|c| c.name.as_str()).collect();
        debug!(
            turn = update.turn,
            kind = ?update.kind,
            role = ?message.role,
            tool_calls = ?tools,
            chars = message.content.chars().count(),
            "turn update"
        );
    }
}

fn cmd_ask(
    config: &AgentConfig,
    seed: &ConversationSeed,
    show_context: bool,
    verbose: bool,
    format: OutputFormat,
) -> Result<String> {
    let rt = runtime()?;

    let outcome = rt.block_on(async {
        let orchestrator = Orchestrator::from_config(config).await?;
        if verbose {
            orchestrator.run_with_observer(seed, &log_turn).await
        } else {
            orchestrator.run(seed).await
        }
    })?;

    Ok(format_outcome(&outcome, show_context, format))
}

fn cmd_retrieve(config: &AgentConfig, question: &str, format: OutputFormat) -> Result<String> {
    let rt = runtime()?;

    let documents = rt.block_on(async {
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(config)?);
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        let pipeline = build_pipeline(config, provider, &prompts).await?;
        let documents = pipeline
            .retrieve(question)
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("Retrieval failed: {e}")))?;
        Ok::<_, Error>(documents)
    })?;

    Ok(format_documents(&documents, format))
}

#[cfg(feature = "server")]
fn cmd_serve(config: &AgentConfig, host: &str, port: u16) -> Result<String> {
    let rt = runtime()?;

    rt.block_on(async {
        let orchestrator = Orchestrator::from_config(config).await?;
        crate::server::serve(Arc::new(orchestrator), host, port)
            .await
            .map_err(|e| CommandError::ExecutionFailed(format!("HTTP server error: {e}")))?;
        Ok::<_, Error>(())
    })?;

    Ok(String::new())
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize the agent's prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len(),
            });
            Ok(format.to_json(&json))
        }
    }
}
