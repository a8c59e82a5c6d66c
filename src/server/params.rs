//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::agent::ConversationSeed;

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBody {
    /// The user's question.
    pub user_message: String,

    /// Optional directive, e.g. authorizing web search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
}

impl From<ChatBody> for ConversationSeed {
    fn from(body: ChatBody) -> Self {
        Self {
            user_message: body.user_message,
            developer_message: body.developer_message,
        }
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub detail: String,
}
