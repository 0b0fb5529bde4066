// SPDX-License-Identifier: MIT

//! Kubelet pprof collector.
//!
//! `GET https://<node-ip>:10250/debug/pprof/profile`, authenticated by a
//! bearer token, over TLS >= 1.2 with a caller-supplied root set.

use crate::CollectError;
use chrono::Utc;
use noa_core::{RunId, TaskKind, TaskOutcome};
use reqwest::tls::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Everything the kubelet collector needs, owned by the caller and shared
/// read-only across runs.
#[derive(Clone)]
pub struct KubeletConfig {
    pub node_ip: String,
    pub token: Arc<str>,
    /// PEM-encoded CA bundle used to build the client's root store.
    pub ca_certs: Arc<[u8]>,
    pub storage_folder: PathBuf,
}

#[instrument(skip(config), fields(run_id = %run_id))]
pub async fn collect(run_id: RunId, config: &KubeletConfig) -> TaskOutcome {
    let url = target_url(&config.node_ip);
    collect_at(run_id, config, &url).await
}

/// Core of [`collect`], taking the target URL as a parameter so tests can
/// point it at a plain-HTTP mock instead of the real kubelet endpoint.
async fn collect_at(run_id: RunId, config: &KubeletConfig, url: &str) -> TaskOutcome {
    let begin_time = Utc::now();
    match run(run_id, config, url).await {
        Ok(()) => {
            info!("kubelet profile captured");
            TaskOutcome::success(TaskKind::Kubelet, begin_time, Utc::now())
        }
        Err(err) => {
            error!(error = %err, "kubelet collector failed");
            TaskOutcome::failure(TaskKind::Kubelet, begin_time, Utc::now(), err.to_string())
        }
    }
}

/// `https://<node-ip>:10250/debug/pprof/profile`, bracketing the host when
/// `node_ip` is an IPv6 literal (matching `net.JoinHostPort` in the
/// original agent).
fn target_url(node_ip: &str) -> String {
    let host = match node_ip.parse::<std::net::IpAddr>() {
        Ok(std::net::IpAddr::V6(v6)) => format!("[{v6}]"),
        _ => node_ip.to_string(),
    };
    format!("https://{host}:10250/debug/pprof/profile")
}

async fn run(run_id: RunId, config: &KubeletConfig, url: &str) -> Result<(), CollectError> {
    let mut root_store = reqwest::tls::Certificate::from_pem_bundle(&config.ca_certs)
        .map_err(|err| CollectError::Transport(err.to_string()))?;
    let mut builder = reqwest::Client::builder().min_tls_version(Version::TLS_1_2);
    for cert in root_store.drain(..) {
        builder = builder.add_root_certificate(cert);
    }
    let client = builder.build().map_err(|err| CollectError::Request(err.to_string()))?;

    let response = client
        .get(url)
        .bearer_auth(&config.token)
        .send()
        .await
        .map_err(|err| CollectError::Transport(err.to_string()))?;

    if !response.status().is_success() {
        return Err(CollectError::Status(response.status()));
    }

    let path = config.storage_folder.join(format!("kubelet-{run_id}.pprof"));
    write_body(response, &path).await
}

async fn write_body(response: reqwest::Response, path: &std::path::Path) -> Result<(), CollectError> {
    use futures_util::StreamExt;

    let mut file = tokio::fs::File::create(path).await.map_err(|source| CollectError::Write {
        path: path.display().to_string(),
        source,
    })?;
    set_mode_0600(&file, path).await?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| CollectError::Transport(err.to_string()))?;
        file.write_all(&chunk).await.map_err(|source| CollectError::Write {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

async fn set_mode_0600(file: &tokio::fs::File, path: &std::path::Path) -> Result<(), CollectError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = file
        .metadata()
        .await
        .map_err(|source| CollectError::Write { path: path.display().to_string(), source })?
        .permissions();
    perms.set_mode(0o600);
    file.set_permissions(perms)
        .await
        .map_err(|source| CollectError::Write { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(dir: &std::path::Path) -> KubeletConfig {
        KubeletConfig {
            node_ip: "127.0.0.1".to_string(),
            token: Arc::from("test-token"),
            ca_certs: Arc::from(Vec::new().into_boxed_slice()),
            storage_folder: dir.to_path_buf(),
        }
    }

    #[test]
    fn target_url_brackets_ipv6_hosts() {
        assert_eq!(target_url("10.0.0.1"), "https://10.0.0.1:10250/debug/pprof/profile");
        assert_eq!(target_url("::1"), "https://[::1]:10250/debug/pprof/profile");
        assert_eq!(
            target_url("fe80::1ff:fe23:4567:890a"),
            "https://[fe80::1ff:fe23:4567:890a]:10250/debug/pprof/profile"
        );
    }

    // The kubelet endpoint is HTTPS with a custom CA in production; these
    // tests drive the real `run`/`collect_at` logic (client build, bearer
    // auth, status handling, streaming write) against a plain HTTP mock by
    // passing the mock's URL in directly, bypassing only `target_url`.

    #[tokio::test]
    async fn non_200_status_is_recorded_as_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/debug/pprof/profile"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let url = format!("http://{}/debug/pprof/profile", server.address());
        let run_id = RunId::new();

        let outcome = collect_at(run_id, &config, &url).await;

        assert!(!outcome.successful);
        assert!(!dir.path().join(format!("kubelet-{run_id}.pprof")).exists());
        assert!(outcome.error.contains("503"));
    }

    #[tokio::test]
    async fn success_response_is_written_to_the_pprof_file_with_mode_0600() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/debug/pprof/profile"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"profile-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let url = format!("http://{}/debug/pprof/profile", server.address());
        let run_id = RunId::new();

        let outcome = collect_at(run_id, &config, &url).await;
        assert!(outcome.successful);

        let path = dir.path().join(format!("kubelet-{run_id}.pprof"));
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"profile-bytes");

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
