//! # Process termination signals.
//!
//! [`wait_for_shutdown_signal`] completes when the process is asked to stop.
//! The server binary cancels the queue token and drains the HTTP listener
//! when it returns.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal.
///
/// Returns `Err` if a signal handler cannot be registered.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        res = tokio::signal::ctrl_c() => { res?; "SIGINT" },
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = name, "shutdown signal received");
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Err` if the Ctrl-C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl_c", "shutdown signal received");
    Ok(())
}
