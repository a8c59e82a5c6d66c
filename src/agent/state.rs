//! Per-run conversation state.

use serde::Serialize;

use super::message::ChatMessage;
use crate::core::Document;

/// State owned by a single orchestrator run.
///
/// Only append operations are exposed: messages already in the transcript
/// are never edited, and context documents are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentState {
    messages: Vec<ChatMessage>,
    context: Vec<Document>,
}

impl AgentState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation transcript in append order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Documents retrieved so far in this run.
    #[must_use]
    pub fn context(&self) -> &[Document] {
        &self.context
    }

    /// The most recently appended message.
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Appends a message to the transcript.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Merges documents into the context.
    ///
    /// Documents already present (same source, page and content) are
    /// skipped. Returns how many were added.
    pub fn merge_context(&mut self, documents: Vec<Document>) -> usize {
        let before = self.context.len();
        for doc in documents {
            if !self.context.iter().any(|existing| existing.same_chunk(&doc)) {
                self.context.push(doc);
            }
        }
        self.context.len() - before
    }

    /// Consumes the state, returning the transcript and context.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ChatMessage>, Vec<Document>) {
        (self.messages, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{system_message, user_message};

    #[test]
    fn test_push_preserves_order() {
        let mut state = AgentState::new();
        state.push_message(system_message("sys"));
        state.push_message(user_message("hi"));
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.last_message().map(|m| m.content.as_str()), Some("hi"));
    }

    #[test]
    fn test_merge_context_dedupes() {
        let mut state = AgentState::new();
        let a = Document::new("alpha", "a.txt", Some(1));
        let b = Document::new("beta", "b.txt", None);

        assert_eq!(state.merge_context(vec![a.clone(), b.clone()]), 2);
        assert_eq!(state.merge_context(vec![a.with_score(0.4), b]), 0);
        assert_eq!(
            state.merge_context(vec![Document::new("alpha", "a.txt", Some(2))]),
            1
        );
        assert_eq!(state.context().len(), 3);
        assert_eq!(state.context()[0], a);
    }
}
