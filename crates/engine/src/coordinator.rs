// SPDX-License-Identifier: MIT

//! Fans out the task set for the current mode, joins under a deadline,
//! commits a success log or error marker, and always releases the lock.

use chrono::Utc;
use noa_collectors::{collect_kubelet, collect_runtime, collect_script, KubeletConfig, RuntimeConfig};
use noa_core::{Run, RunId, TaskOutcome};
use noa_storage::StateLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// Profile-mode join deadline.
pub const PROFILE_DEADLINE: Duration = Duration::from_secs(35);
/// Script-mode join deadline.
pub const SCRIPT_DEADLINE: Duration = Duration::from_secs(7200);

/// Which mutually exclusive mode the agent is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Profiling,
    Scripting,
}

/// The collector configurations a coordinator needs for its mode.
/// Immutable after start-up; shared read-only across runs.
#[derive(Clone)]
pub enum Collectors {
    Profiling { kubelet: KubeletConfig, runtime: RuntimeConfig },
    Scripting { script: Arc<str> },
}

/// The per-run coordinator. Stateless beyond the shared lock and
/// collector configuration; `run` is the single operation.
pub struct Coordinator {
    lock: Arc<StateLock>,
    collectors: Collectors,
    storage_folder: PathBuf,
}

impl Coordinator {
    pub fn new(lock: Arc<StateLock>, collectors: Collectors, storage_folder: PathBuf) -> Self {
        Self { lock, collectors, storage_folder }
    }

    /// Run one admitted run to completion. Invoked in its own scheduling
    /// context (a spawned task) after admission; never joined by the
    /// caller.
    #[instrument(skip(self), fields(run_id = %id))]
    pub async fn run(&self, id: RunId) {
        let mut run = Run::new(id);
        let (tx, mut rx) = mpsc::channel::<TaskOutcome>(2);
        let expected = self.spawn_collectors(id, tx);
        let deadline = self.deadline();

        let mut received = 0usize;
        let sleep = tokio::time::sleep(deadline);
        tokio::pin!(sleep);
        loop {
            if received >= expected {
                break;
            }
            tokio::select! {
                outcome = rx.recv() => {
                    match outcome {
                        Some(outcome) => {
                            received += 1;
                            run.push(outcome);
                        }
                        None => break,
                    }
                }
                _ = &mut sleep => {
                    warn!(deadline_secs = deadline.as_secs(), "coordinator deadline elapsed");
                    let now = Utc::now();
                    run.push(TaskOutcome::timeout(now, deadline.as_secs()));
                    break;
                }
            }
        }

        self.commit(run).await;
    }

    fn spawn_collectors(&self, id: RunId, tx: mpsc::Sender<TaskOutcome>) -> usize {
        match &self.collectors {
            Collectors::Profiling { kubelet, runtime } => {
                let kubelet = kubelet.clone();
                let tx_kubelet = tx.clone();
                tokio::spawn(async move {
                    let outcome = collect_kubelet(id, &kubelet).await;
                    let _ = tx_kubelet.send(outcome).await;
                });

                let runtime = runtime.clone();
                tokio::spawn(async move {
                    let outcome = collect_runtime(id, &runtime).await;
                    let _ = tx.send(outcome).await;
                });
                2
            }
            Collectors::Scripting { script } => {
                let script = Arc::clone(script);
                tokio::spawn(async move {
                    let outcome = collect_script(id, &script).await;
                    let _ = tx.send(outcome).await;
                });
                1
            }
        }
    }

    fn deadline(&self) -> Duration {
        match self.collectors {
            Collectors::Profiling { .. } => PROFILE_DEADLINE,
            Collectors::Scripting { .. } => SCRIPT_DEADLINE,
        }
    }

    async fn commit(&self, run: Run) {
        let successful = run.successful();
        if successful {
            let path = self.storage_folder.join(format!("{}.log", run.id));
            if let Err(err) = noa_storage::write_run_file(&path, &run) {
                error!(error = %err, "failed to write success log");
            } else {
                info!(run_id = %run.id, "run committed successfully");
            }
        } else if let Err(err) = self.lock.commit_error(&run) {
            error!(error = %err, "failed to commit error marker");
        }

        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_mode_happy_path_commits_one_successful_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Arc::new(StateLock::new(dir.path().join("agent.err")));
        let (id, _) = lock.try_acquire().unwrap();
        let coordinator = Coordinator::new(
            Arc::clone(&lock),
            Collectors::Scripting { script: Arc::from("true") },
            dir.path().to_path_buf(),
        );

        coordinator.run(id).await;

        let log_path = dir.path().join(format!("{id}.log"));
        assert!(log_path.exists());
        assert!(!dir.path().join("agent.err").exists());

        let run: Run = serde_json::from_str(&std::fs::read_to_string(&log_path).unwrap()).unwrap();
        assert_eq!(run.outcomes.len(), 1);
        assert!(run.successful());

        let (_, state) = lock.inspect().unwrap();
        assert_eq!(state, noa_storage::LockState::Free);
    }

    #[tokio::test]
    async fn failing_script_commits_an_error_marker() {
        let dir = tempfile::tempdir().unwrap();
        let lock = Arc::new(StateLock::new(dir.path().join("agent.err")));
        let (id, _) = lock.try_acquire().unwrap();
        let coordinator = Coordinator::new(
            Arc::clone(&lock),
            Collectors::Scripting { script: Arc::from("exit 1") },
            dir.path().to_path_buf(),
        );

        coordinator.run(id).await;

        assert!(!dir.path().join(format!("{id}.log")).exists());
        let (_, state) = lock.inspect().unwrap();
        assert_eq!(state, noa_storage::LockState::InError);
    }
}
