//! Concrete tools available to the conversation loop.

pub mod policy_qa;
pub mod web_search;

pub use policy_qa::{PolicyQaArgs, PolicyQaTool};
pub use web_search::{SearchResult, TavilyClient, WebSearchArgs, WebSearchTool, WebSearcher};
