//! ratequeue server: one global queue behind the HTTP edge.
//!
//! Jobs run through the echo generator. Logging: `RUST_LOG=ratequeue=debug`
//! (default `ratequeue=info`) on stderr.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ratequeue::{
    EchoHandler, LogWriter, QueueBuilder, QueueConfig, RetentionPolicy, Subscribe,
    http::{self, HttpConfig},
    wait_for_shutdown_signal,
};

#[derive(Parser, Debug)]
#[command(version, about = "Rate-limited job queue over HTTP")]
struct Args {
    /// HTTP bind address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
    /// Bearer token clients must present (open when unset).
    #[arg(long, env = "RATEQUEUE_CLIENT_KEY")]
    client_key: Option<String>,
    /// Handler deadline in seconds (0 = none).
    #[arg(long, default_value_t = 300)]
    handler_timeout_secs: u64,
    /// Pause between two jobs in seconds.
    #[arg(long, default_value_t = 60)]
    job_cooldown_secs: u64,
    /// Hours a finished job stays pollable (0 = forever, no record cap either).
    #[arg(long, default_value_t = 24)]
    retention_hours: u64,
    /// Simulated generator latency in milliseconds.
    #[arg(long, default_value_t = 2000)]
    echo_latency_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ratequeue=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cfg = QueueConfig {
        handler_timeout: Duration::from_secs(args.handler_timeout_secs),
        job_cooldown: Duration::from_secs(args.job_cooldown_secs),
        retention: RetentionPolicy::for_age(Duration::from_secs(
            args.retention_hours.saturating_mul(3600),
        )),
        ..QueueConfig::default()
    };
    let handler = Arc::new(EchoHandler::new(Duration::from_millis(args.echo_latency_ms)));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let token = CancellationToken::new();
    let queue = QueueBuilder::new(cfg, handler)
        .with_subscribers(subs)
        .spawn(token.clone());

    let stop = token.clone();
    let shutdown = async move {
        if let Err(err) = wait_for_shutdown_signal().await {
            tracing::error!(error = %err, "cannot listen for shutdown signals");
            std::future::pending::<()>().await;
        }
        stop.cancel();
    };

    let res = http::serve(
        queue,
        HttpConfig {
            bind: args.bind,
            client_key: args.client_key.filter(|k| !k.is_empty()),
        },
        shutdown,
    )
    .await;
    token.cancel();
    res
}
