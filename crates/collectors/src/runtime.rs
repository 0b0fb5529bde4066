// SPDX-License-Identifier: MIT

//! Runtime (CRI-O) pprof collector.
//!
//! `GET http://localhost:6060/debug/pprof/profile`, either over the
//! default TCP transport or dialed through a local Unix socket whose
//! path is fixed at construction time.

use crate::unix_connector::UnixConnector;
use crate::CollectError;
use chrono::Utc;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use noa_core::{RunId, TaskKind, TaskOutcome};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct RuntimeConfig {
    pub crio_unix_socket: Option<PathBuf>,
    pub crio_prefer_unix_socket: bool,
    pub storage_folder: PathBuf,
}

const URL: &str = "http://localhost:6060/debug/pprof/profile";

#[instrument(skip(config), fields(run_id = %run_id))]
pub async fn collect(run_id: RunId, config: &RuntimeConfig) -> TaskOutcome {
    let begin_time = Utc::now();
    let result = if config.crio_prefer_unix_socket {
        let socket_path = match &config.crio_unix_socket {
            Some(path) => path.clone(),
            None => {
                return TaskOutcome::failure(
                    TaskKind::Runtime,
                    begin_time,
                    Utc::now(),
                    "CrioPreferUnixSocket set without CrioUnixSocket",
                )
            }
        };
        run_over_unix_socket(run_id, &config.storage_folder, socket_path).await
    } else {
        run_over_tcp(run_id, &config.storage_folder).await
    };

    match result {
        Ok(()) => {
            info!("runtime profile captured");
            TaskOutcome::success(TaskKind::Runtime, begin_time, Utc::now())
        }
        Err(err) => {
            error!(error = %err, "runtime collector failed");
            TaskOutcome::failure(TaskKind::Runtime, begin_time, Utc::now(), err.to_string())
        }
    }
}

async fn run_over_tcp(run_id: RunId, storage_folder: &std::path::Path) -> Result<(), CollectError> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(|err| CollectError::Request(err.to_string()))?;
    let response = client
        .get(URL)
        .send()
        .await
        .map_err(|err| CollectError::Transport(err.to_string()))?;
    if !response.status().is_success() {
        return Err(CollectError::Status(response.status()));
    }
    let path = storage_folder.join(format!("crio-{run_id}.pprof"));
    let bytes = response.bytes().await.map_err(|err| CollectError::Transport(err.to_string()))?;
    write_artifact(&path, &bytes).await
}

async fn run_over_unix_socket(
    run_id: RunId,
    storage_folder: &std::path::Path,
    socket_path: PathBuf,
) -> Result<(), CollectError> {
    let client: LegacyClient<_, Empty<Bytes>> =
        LegacyClient::builder(TokioExecutor::new()).build(UnixConnector::new(socket_path));

    let request = hyper::Request::builder()
        .uri(URL)
        .body(Empty::<Bytes>::new())
        .map_err(|err| CollectError::Request(err.to_string()))?;

    let response = client
        .request(request)
        .await
        .map_err(|err| CollectError::Transport(err.to_string()))?;

    if !response.status().is_success() {
        return Err(CollectError::Status(response.status()));
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|err| CollectError::Transport(err.to_string()))?
        .to_bytes();

    let path = storage_folder.join(format!("crio-{run_id}.pprof"));
    write_artifact(&path, &body).await
}

async fn write_artifact(path: &std::path::Path, bytes: &[u8]) -> Result<(), CollectError> {
    use std::os::unix::fs::PermissionsExt;

    let mut file = tokio::fs::File::create(path).await.map_err(|source| CollectError::Write {
        path: path.display().to_string(),
        source,
    })?;
    file.write_all(bytes).await.map_err(|source| CollectError::Write {
        path: path.display().to_string(),
        source,
    })?;
    let mut perms = file
        .metadata()
        .await
        .map_err(|source| CollectError::Write { path: path.display().to_string(), source })?
        .permissions();
    perms.set_mode(0o600);
    file.set_permissions(perms).await.map_err(|source| CollectError::Write {
        path: path.display().to_string(),
        source,
    })
}
