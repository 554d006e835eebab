//! Liveness endpoint
//!
//! Hosting platforms that port-scan for a web service need something to
//! answer on `$PORT`; this is it. It shares nothing with the chat side.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tracing::info;

pub const GREETING: &str = "Twirl is wandering Emerald Shores 🐌✨";

async fn home() -> &'static str {
    GREETING
}

pub fn router() -> Router {
    Router::new().route("/", get(home))
}

/// Serve the liveness route on `0.0.0.0:port` until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind liveness server on {}", addr))?;
    info!("Liveness server listening on {}", addr);
    axum::serve(listener, router())
        .await
        .context("Liveness server stopped")?;
    Ok(())
}
