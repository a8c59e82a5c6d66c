//! HTTP API for the policy agent.
//!
//! # Feature Gate
//!
//! This module requires the `server` feature flag (enabled by default).
//!
//! # Routes
//!
//! ```text
//! POST /api/chat         {user_message, developer_message?} → text/plain answer
//! POST /api/chat/stream  same body → application/x-ndjson, one line per turn,
//!                        then {"answer": ...} or {"error": ...}
//! GET  /api/health       {"status": "ok"}
//! ```
//!
//! Every request runs on its own [`AgentState`](crate::agent::AgentState);
//! the [`Orchestrator`](crate::agent::Orchestrator) is shared read-only.

pub mod params;
pub mod routes;
pub mod transport;

pub use params::{ChatBody, ErrorBody};
pub use routes::router;
pub use transport::serve;
