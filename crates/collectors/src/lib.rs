// SPDX-License-Identifier: MIT

//! The three collectors: kubelet, runtime (CRI-O), and script.
//!
//! Each is a pure async function `(run_id) -> TaskOutcome` that records
//! `begin_time`, performs its I/O, and records `end_time` on every exit
//! path. None of them are cancellation-aware; the run coordinator bounds
//! total wall time externally.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod kubelet;
mod runtime;
mod script;
mod unix_connector;

pub use kubelet::{collect as collect_kubelet, KubeletConfig};
pub use runtime::{collect as collect_runtime, RuntimeConfig};
pub use script::collect as collect_script;

use thiserror::Error;

/// Internal failure modes, always folded into a failed [`noa_core::TaskOutcome`]
/// rather than surfaced to a caller — collectors never return `Result`.
#[derive(Debug, Error)]
pub(crate) enum CollectError {
    #[error("building request: {0}")]
    Request(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("writing {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },
    #[error("running script: {0}")]
    Spawn(#[source] std::io::Error),
}
