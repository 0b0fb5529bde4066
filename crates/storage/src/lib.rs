// SPDX-License-Identifier: MIT

//! Single-flight admission lock backed by a durable error marker.
//!
//! Mirrors the shape of the daemon workspace's lifecycle/storage layer:
//! a `parking_lot::Mutex`-guarded value type with bounded filesystem I/O
//! under the lock, and `thiserror` at the crate boundary.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod lock;
mod persist;

pub use lock::{LockState, StateLock};
pub use persist::{write_run_file, PersistError};

use thiserror::Error;

/// Errors raised by the state lock's filesystem operations.
#[derive(Debug, Error)]
pub enum StateLockError {
    #[error("reading error marker: {0}")]
    Read(#[from] std::io::Error),
    #[error("persisting error marker: {0}")]
    Persist(#[from] PersistError),
}
