//! Core domain types shared by retrieval and the agent.

pub mod chunking;
pub mod document;

pub use document::{Citation, Document};
