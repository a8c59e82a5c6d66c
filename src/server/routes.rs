//! Route handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures_util::{StreamExt, stream};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use super::params::{ChatBody, ErrorBody};
use crate::agent::{ConversationSeed, Orchestrator, RunOutcome, TurnUpdate};
use crate::error::AgentError;

/// Builds the API router around a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .layer(CorsLayer::permissive())
        .with_state(orchestrator)
}

/// A failed request, rendered as `{"detail": ...}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

/// Detail returned for failures other than invalid input. The full error
/// is only logged.
const RUN_FAILED_DETAIL: &str = "agent run failed";

/// Caller-facing description of a run failure.
fn public_detail(e: &AgentError) -> String {
    match e {
        AgentError::InvalidRequest { .. } => e.to_string(),
        _ => RUN_FAILED_DETAIL.to_string(),
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        let status = match e {
            AgentError::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: public_detail(&e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

fn validate(body: &ChatBody) -> Result<(), ApiError> {
    if body.user_message.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "user_message cannot be empty".to_string(),
        });
    }
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(body): Json<ChatBody>,
) -> Result<String, ApiError> {
    validate(&body)?;
    info!(stream = false, "received chat request");

    let seed = ConversationSeed::from(body);
    match orchestrator.run(&seed).await {
        Ok(outcome) => Ok(outcome.answer),
        Err(e) => {
            error!(error = %e, "chat request failed");
            Err(e.into())
        }
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn ndjson_line(value: &impl serde::Serialize) -> String {
    let mut line = serde_json::to_string(value)
        .unwrap_or_else(|e| json!({ "error": format!("serialization error: {e}") }).to_string());
    line.push('\n');
    line
}

fn final_line(result: Result<Result<RunOutcome, AgentError>, tokio::task::JoinError>) -> String {
    match result {
        Ok(Ok(outcome)) => ndjson_line(&json!({ "answer": outcome.answer })),
        Ok(Err(e)) => {
            error!(error = %e, "streamed chat request failed");
            ndjson_line(&json!({ "error": public_detail(&e) }))
        }
        Err(e) => {
            error!(error = %e, "streamed chat task failed");
            ndjson_line(&json!({ "error": RUN_FAILED_DETAIL }))
        }
    }
}

async fn chat_stream(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    validate(&body)?;
    info!(stream = true, "received chat request");

    let seed = ConversationSeed::from(body);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<TurnUpdate>();
    let task = AbortOnDrop(tokio::spawn(async move {
        orchestrator.run_with_observer(&seed, &tx).await
    }));

    // The update stream ends when the task drops its sender. Dropping the
    // body before then drops `task`, which aborts the run.
    let updates = UnboundedReceiverStream::new(rx).map(|update| ndjson_line(&update));
    let outcome = stream::once(async move {
        let mut task = task;
        final_line((&mut task.0).await)
    });
    let lines = updates.chain(outcome).map(Ok::<_, Infallible>);

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::agent::{
        ChatRequest, ChatResponse, LlmProvider, ModelGateway, PromptSet, TokenUsage, ToolRegistry,
    };
    use crate::retrieval::{HashEmbedder, InMemoryStore, LexicalReranker, RetrievalPipeline};
    use crate::tools::{PolicyQaTool, WebSearchTool};

    struct FixedProvider {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if self.fail {
                return Err(AgentError::ApiRequest {
                    message: "upstream unavailable".to_string(),
                    status: Some(503),
                });
            }
            Ok(ChatResponse {
                content: "Case plans are due within 60 days.".to_string(),
                usage: TokenUsage::default(),
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    async fn app(fail: bool) -> Router {
        let provider: Arc<dyn LlmProvider> = Arc::new(FixedProvider { fail });
        let store = InMemoryStore::from_documents(Arc::new(HashEmbedder::default()), Vec::new())
            .await
            .unwrap_or_else(|e| panic!("empty index: {e}"));
        let pipeline = RetrievalPipeline::new(
            Arc::new(store),
            Arc::new(LexicalReranker),
            ModelGateway::new(Arc::clone(&provider), "gpt-4.1-nano", 256, Duration::from_secs(5)),
        );
        let registry = ToolRegistry::new(
            PolicyQaTool::new(Arc::new(pipeline)),
            WebSearchTool::new(None, 5),
        );
        let orchestrator = Orchestrator::new(
            ModelGateway::new(provider, "gpt-4.1", 1024, Duration::from_secs(5)),
            Arc::new(registry),
            PromptSet::defaults(),
            10,
        );
        router(Arc::new(orchestrator))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|e| panic!("request: {e}"))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("body: {e}"));
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap_or_else(|e| panic!("request: {e}"));
        let response = app(false)
            .await
            .oneshot(request)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_chat_returns_plain_text() {
        let response = app(false)
            .await
            .oneshot(post_json("/api/chat", r#"{"user_message": "When are case plans due?"}"#))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Case plans are due within 60 days.");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let response = app(false)
            .await
            .oneshot(post_json("/api/chat", r#"{"user_message": "  "}"#))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("detail"));
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_field() {
        let response = app(false)
            .await
            .oneshot(post_json("/api/chat", r#"{"developer_message": "x"}"#))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_chat_failure_is_500_with_generic_detail() {
        let response = app(true)
            .await
            .oneshot(post_json("/api/chat", r#"{"user_message": "Question"}"#))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await)
            .unwrap_or_else(|e| panic!("not JSON: {e}"));
        assert_eq!(body["detail"], RUN_FAILED_DETAIL);
        assert!(!body.to_string().contains("upstream"));
    }

    #[test]
    fn test_api_error_hides_internal_detail() {
        let invalid = ApiError::from(AgentError::InvalidRequest {
            message: "user_message is empty".to_string(),
        });
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(invalid.detail.contains("user_message is empty"));

        let internal = ApiError::from(AgentError::Configuration {
            message: "QDRANT_URL=http://10.0.0.5:6333 unreachable".to_string(),
        });
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.detail, RUN_FAILED_DETAIL);
    }

    #[tokio::test]
    async fn test_stream_emits_turns_then_answer() {
        let response = app(false)
            .await
            .oneshot(post_json("/api/chat/stream", r#"{"user_message": "Question"}"#))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/x-ndjson")
        );

        let text = body_text(response).await;
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad line {l}: {e}")))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "model");
        assert_eq!(lines[0]["turn"], 1);
        assert_eq!(lines[1]["answer"], "Case plans are due within 60 days.");
    }

    #[tokio::test]
    async fn test_stream_reports_failure_in_final_line() {
        let response = app(true)
            .await
            .oneshot(post_json("/api/chat/stream", r#"{"user_message": "Question"}"#))
            .await
            .unwrap_or_else(|_| unreachable!());

        let text = body_text(response).await;
        let last: serde_json::Value = text
            .lines()
            .last()
            .and_then(|l| serde_json::from_str(l).ok())
            .unwrap_or_default();
        assert_eq!(last["error"], RUN_FAILED_DETAIL);
        assert!(!text.contains("upstream"));
    }
}
