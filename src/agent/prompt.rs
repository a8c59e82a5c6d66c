//! System prompts and template builders.
//!
//! The system prompt seeds every conversation; the RAG template frames
//! the grounded generation step of the retrieval pipeline. Both can be
//! overridden from markdown files in a prompt directory.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::core::Document;

/// System instruction that seeds every conversation.
pub const SYSTEM_PROMPT: &str = r"You are a helpful assistant that guides foster care researchers to authoritative information about state and federal foster care policies.

## Rules

1. Answer using only the context returned by your tools. Prefer the `policy_qa` tool for any policy question, and call it before anything else.
2. Cite the source path and page number for every statement you make, e.g. (pub5108.pdf, page 12).
3. If the retrieved context does not support an accurate answer, say you don't know. Do not fill gaps from your own knowledge.
4. You may use `web_search` ONLY if the most recent system directive explicitly authorizes web search. Without that authorization, never call it.
5. When web results are used, cite their URLs and say that they are not official policy documents.";

/// Template for grounded generation. `{question}` and `{context}` are
/// substituted by [`render_rag_prompt`].
pub const RAG_TEMPLATE: &str = r"You are a helpful and kind assistant. Use only the context provided below to answer the question.

Every context passage starts with its source and page. Cite them for each statement you make.

If you do not know the answer, or the context does not contain it, say you don't know.

Query:
{question}

Context:
{context}
";

/// Answer returned when reranking leaves no documents to ground on.
pub const NO_CONTEXT_ANSWER: &str =
    "I don't know. No relevant policy documents were found for this question.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/policy-agent/prompts";

/// Filename for the system prompt template.
const SYSTEM_FILENAME: &str = "system.md";
/// Filename for the RAG prompt template.
const RAG_FILENAME: &str = "rag.md";

/// The prompts used by the agent.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System instruction for the conversation loop.
    pub system: String,
    /// Template for grounded generation.
    pub rag_template: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `prompt_dir` (from `--prompt-dir` or `POLICY_AGENT_PROMPT_DIR`)
    /// 2. `~/.config/policy-agent/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|content| !content.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            system: load_file(SYSTEM_FILENAME, SYSTEM_PROMPT),
            rag_template: load_file(RAG_FILENAME, RAG_TEMPLATE),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            rag_template: RAG_TEMPLATE.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [(SYSTEM_FILENAME, SYSTEM_PROMPT), (RAG_FILENAME, RAG_TEMPLATE)];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Renders documents as the context block of the RAG prompt.
///
/// Each passage is headed by its provenance so the model can cite it.
/// Order is preserved.
#[must_use]
pub fn build_context(documents: &[Document]) -> String {
    let mut context = String::new();
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        let _ = write!(context, "[{}] source: {}", i + 1, doc.source);
        if let Some(page) = doc.page {
            let _ = write!(context, ", page: {page}");
        }
        context.push('\n');
        context.push_str(doc.content.trim());
    }
    context
}

/// Substitutes `{question}` and `{context}` into the template.
///
/// Runs a single pass over the template so placeholder-like text inside
/// the question or the documents is left untouched.
#[must_use]
pub fn render_rag_prompt(template: &str, question: &str, context: &str) -> String {
    const QUESTION: &str = "{question}";
    const CONTEXT: &str = "{context}";

    let mut out = String::with_capacity(template.len() + question.len() + context.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix(QUESTION) {
            out.push_str(question);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(CONTEXT) {
            out.push_str(context);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
