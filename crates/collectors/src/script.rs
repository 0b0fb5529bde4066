// SPDX-License-Identifier: MIT

//! Script collector: runs `sh -c <script>` and captures combined output.
//!
//! Unlike the kubelet/runtime collectors, this one enforces no timeout of
//! its own — the run coordinator's deadline is the only bound, per the
//! joined-task contract.

use crate::CollectError;
use chrono::Utc;
use noa_core::{RunId, TaskKind, TaskOutcome};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, instrument};

#[instrument(skip(script), fields(run_id = %run_id))]
pub async fn collect(run_id: RunId, script: &str) -> TaskOutcome {
    let begin_time = Utc::now();
    let _ = run_id;
    match run(script).await {
        Ok(output) => {
            info!(output = %output, "script completed successfully");
            TaskOutcome::success(TaskKind::Script, begin_time, Utc::now())
        }
        Err(err) => {
            error!(error = %err, "script collector failed");
            TaskOutcome::failure(TaskKind::Script, begin_time, Utc::now(), err.to_string())
        }
    }
}

async fn run(script: &str) -> Result<String, CollectError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(CollectError::Spawn)?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(combined_error(&output.status, &combined));
    }
    Ok(combined)
}

fn combined_error(status: &std::process::ExitStatus, combined: &str) -> CollectError {
    CollectError::Spawn(std::io::Error::other(format!(
        "script exited with {status}: {combined}"
    )))
}
