// SPDX-License-Identifier: MIT

//! `node-observability-agent` binary: argument parsing, pre-flight
//! validation, logger initialization, listener setup, and graceful
//! shutdown. Everything else lives in the core crates.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod config;
mod signal;

use axum::routing::get;
use clap::Parser;
use config::{Cli, ValidatedConfig};
use noa_daemon::AppState;
use noa_engine::Coordinator;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ERROR_MARKER_NAME: &str = "agent.err";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    if cli.version {
        println!("node-observability-agent {}", env!("CARGO_PKG_VERSION"));
        return std::process::ExitCode::SUCCESS;
    }

    let log_level = cli.log_level.clone();
    let config = match cli.validate() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    init_tracing(&log_level);

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal error");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: ValidatedConfig) -> std::io::Result<()> {
    let lock = Arc::new(noa_storage::StateLock::new(config.storage.join(ERROR_MARKER_NAME)));
    let coordinator =
        Arc::new(Coordinator::new(Arc::clone(&lock), config.collectors, config.storage.clone()));
    let state = AppState { lock, coordinator };

    let app = noa_daemon::router(config.mode, state).route("/version", get(version));

    if config.prefer_unix_socket {
        let path = config
            .unix_socket
            .as_deref()
            .ok_or_else(|| std::io::Error::other("--prefer-unix-socket set without --unix-socket"))?;
        let _ = std::fs::remove_file(path);
        let listener = tokio::net::UnixListener::bind(path)?;
        info!(path = %path.display(), "listening on unix socket");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown())
            .await?;
    } else {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "listening on tcp");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown())
            .await?;
    }
    Ok(())
}

async fn shutdown() {
    if let Err(err) = signal::wait_for_shutdown().await {
        error!(error = %err, "failed to install signal handler");
    }
}

async fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
