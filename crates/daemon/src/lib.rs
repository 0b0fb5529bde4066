// SPDX-License-Identifier: MIT

//! The request surface: two endpoints that drive the engine and translate
//! lock state into HTTP status codes.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod handlers;

pub use handlers::AppState;

use axum::routing::{get, post};
use axum::Router;
use noa_engine::Mode;

/// Assemble the router for the given mode.
///
/// Profiling mode mounts `POST /node-observability-pprof`; scripting mode
/// mounts `POST /node-observability-scripting`. `GET
/// /node-observability-status` is mounted in both modes.
pub fn router(mode: Mode, state: AppState) -> Router {
    let router = match mode {
        Mode::Profiling => Router::new().route("/node-observability-pprof", post(handlers::start_run)),
        Mode::Scripting => {
            Router::new().route("/node-observability-scripting", post(handlers::start_run))
        }
    };
    router
        .route("/node-observability-status", get(handlers::status))
        .with_state(state)
}
