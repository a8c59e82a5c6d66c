//! LLM provider implementations.

pub mod openai;

pub(crate) use openai::map_openai_error;
pub use openai::{OpenAiProvider, openai_client};
