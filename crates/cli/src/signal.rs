// SPDX-License-Identifier: MIT

//! Graceful-shutdown trigger: resolves on the first of SIGINT, SIGTERM, or
//! SIGQUIT.

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Waits for a termination signal, then returns. Intended as the future
/// passed to `axum::serve(..).with_graceful_shutdown(..)`.
pub async fn wait_for_shutdown() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigquit.recv() => info!("received SIGQUIT, shutting down"),
    }
    Ok(())
}
