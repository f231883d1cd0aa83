//! Liveness endpoint.
//!
//! A single unauthenticated GET returning a fixed body, used by the hosting
//! platform's process-health monitoring. No other semantics.

use axum::{routing::get, Router};
use tokio::task::JoinHandle;
use tracing::{error, info};

const HEALTH_BODY: &str = "Bot is running OK!";

async fn health_handler() -> &'static str {
    HEALTH_BODY
}

/// Bind the liveness listener and serve it on a background task.
pub async fn spawn(port: u16) -> std::io::Result<JoinHandle<()>> {
    let app = Router::new().route("/", get(health_handler));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("liveness endpoint listening on port {port}");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("liveness server error: {e}");
        }
    }))
}
