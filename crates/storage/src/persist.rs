// SPDX-License-Identifier: MIT

//! Durable 0600 JSON writes shared by the error marker and the success log.

use noa_core::Run;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serializing run: {0}")]
    Json(#[from] serde_json::Error),
    #[error("writing {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

/// Serialize `run` to `path` and set its mode to `0600`.
///
/// Used for both the success log (`<id>.log`) and the error marker
/// (`agent.err`) — both are canonical Run serializations per the data
/// model, differing only in which path they land at.
pub fn write_run_file(path: &Path, run: &Run) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec_pretty(run)?;
    fs::write(path, &bytes).map_err(|source| PersistError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut perms = fs::metadata(path)
        .map_err(|source| PersistError::Io { path: path.display().to_string(), source })?
        .permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
        .map_err(|source| PersistError::Io { path: path.display().to_string(), source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use noa_core::{RunId, TaskKind, TaskOutcome};
    use std::os::unix::fs::MetadataExt;

    fn sample_run() -> Run {
        let mut run = Run::new(RunId::new());
        let now = chrono::Utc::now();
        run.push(TaskOutcome::success(TaskKind::Kubelet, now, now));
        run
    }

    #[test]
    fn written_file_has_mode_0600() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.err");
        write_run_file(&path, &sample_run()).unwrap();
        let mode = fs::metadata(&path).unwrap().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn written_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let run = sample_run();
        write_run_file(&path, &run).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let back: Run = serde_json::from_str(&contents).unwrap();
        assert_eq!(run, back);
    }
}
