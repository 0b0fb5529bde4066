// SPDX-License-Identifier: MIT

//! The three-state single-flight admission lock.

use crate::{persist, StateLockError};
use noa_core::{Run, RunId};
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, warn};

/// The lock's three observable states.
///
/// Invariant: `Taken` implies a single assigned identifier in memory;
/// `InError` implies the error marker file exists and parses to a Run;
/// `Free` implies neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Free,
    Taken,
    InError,
}

struct Inner {
    holder: Option<RunId>,
}

/// Single-flight admission gate backed by a durable error marker file.
///
/// All four operations (`try_acquire`, `release`, `commit_error`,
/// `inspect`) serialize on one exclusive lock; callers may assume
/// linearizability. When both an in-memory holder and the error marker
/// are present, the error marker wins — this is a deliberate clarification
/// over the upstream agent's `Lock()`, which checked the in-memory holder
/// first; `LockInfo()` there already checked the marker first, and that
/// precedence is the one we apply uniformly.
pub struct StateLock {
    inner: Mutex<Inner>,
    error_marker_path: PathBuf,
}

impl StateLock {
    pub fn new(error_marker_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(Inner { holder: None }),
            error_marker_path: error_marker_path.into(),
        }
    }

    /// Attempt to take the single admission token.
    ///
    /// Never blocks waiting for the gate to open.
    pub fn try_acquire(&self) -> Result<(RunId, LockState), StateLockError> {
        let mut inner = self.inner.lock();
        if let Some(marker) = self.read_error_marker()? {
            return Ok((marker, LockState::InError));
        }
        if let Some(holder) = inner.holder {
            return Ok((holder, LockState::Taken));
        }
        let id = RunId::new();
        inner.holder = Some(id);
        Ok((id, LockState::Free))
    }

    /// Report the current state without minting a new identifier.
    pub fn inspect(&self) -> Result<(RunId, LockState), StateLockError> {
        let inner = self.inner.lock();
        if let Some(marker) = self.read_error_marker()? {
            return Ok((marker, LockState::InError));
        }
        match inner.holder {
            Some(holder) => Ok((holder, LockState::Taken)),
            None => Ok((RunId::nil(), LockState::Free)),
        }
    }

    /// Clear the in-memory holder unconditionally. Does not remove the
    /// error marker.
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        inner.holder = None;
    }

    /// Durably record a failed run. Idempotent over identical Runs.
    pub fn commit_error(&self, run: &Run) -> Result<(), StateLockError> {
        let _inner = self.inner.lock();
        persist::write_run_file(&self.error_marker_path, run)?;
        warn!(run_id = %run.id, "run committed to error marker");
        Ok(())
    }

    /// Caller already holds `self.inner`'s lock.
    fn read_error_marker(&self) -> Result<Option<RunId>, StateLockError> {
        let contents = match std::fs::read_to_string(&self.error_marker_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StateLockError::Read(err)),
        };
        match serde_json::from_str::<Run>(&contents) {
            Ok(run) => Ok(Some(run.id)),
            Err(err) => {
                debug!(error = %err, "error marker present but unparseable");
                Ok(Some(RunId::nil()))
            }
        }
    }
}
