//! HTTP listener.

use std::sync::Arc;

use tracing::info;

use super::routes::router;
use crate::agent::Orchestrator;

/// Serves the API on `host:port` until Ctrl-C.
///
/// In-flight requests are allowed to finish after the shutdown signal.
///
/// # Errors
///
/// Returns an error if the server fails to bind or encounters a runtime error.
pub async fn serve(orchestrator: Arc<Orchestrator>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "policy agent API listening");

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
