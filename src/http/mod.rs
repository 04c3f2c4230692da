//! HTTP edge: `POST /jobs`, `GET /jobs/{id}`, `GET /usage`, `GET /health`.
//!
//! The caller is identified by the `x-user-id` header. An optional client key
//! gates every route but `/health` behind a bearer token.

mod auth;
mod router;

pub use router::{AppState, router};

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::queue::QueueHandle;

/// Listener settings.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Address to bind.
    pub bind: SocketAddr,
    /// Bearer token required from clients (`None` = open).
    pub client_key: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            client_key: None,
        }
    }
}

/// Serves the router until `shutdown` completes; in-flight requests finish first.
pub async fn serve<F>(queue: QueueHandle, cfg: HttpConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let auth = if cfg.client_key.is_some() { "bearer" } else { "none" };
    let app = router(queue, cfg.client_key);
    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;

    tracing::info!(bind = %cfg.bind, auth, "http edge listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")?;
    tracing::info!("http edge stopped");
    Ok(())
}
