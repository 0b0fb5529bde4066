// SPDX-License-Identifier: MIT

//! Command-line configuration and the pre-flight checks run before the
//! listener binds.

use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// `node-observability-agent` — per-node profiling and scripting sidecar.
#[derive(Parser, Debug)]
#[command(name = "node-observability-agent", version)]
pub struct Cli {
    /// Print the agent version and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Listening TCP port, used unless a local socket is preferred.
    #[arg(long, default_value_t = 9743)]
    pub port: u16,

    /// Listen on this local socket instead of TCP-loopback.
    #[arg(long)]
    pub unix_socket: Option<PathBuf>,

    /// Prefer the local socket over TCP-loopback for the inbound listener.
    #[arg(long, default_value_t = false)]
    pub prefer_unix_socket: bool,

    /// Output directory for run logs, error markers, and profile artifacts.
    #[arg(long, default_value = "/var/run/node-observability")]
    pub storage: PathBuf,

    /// File containing the kubelet bearer token (profiling mode only).
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// File containing the PEM CA bundle for the kubelet TLS client
    /// (profiling mode only).
    #[arg(long)]
    pub ca_file: Option<PathBuf>,

    /// Node IP the kubelet collector targets (profiling mode only).
    #[arg(long, env = "NODE_IP")]
    pub node_ip: Option<String>,

    /// Local socket the runtime (CRI-O) collector dials.
    #[arg(long)]
    pub crio_socket: Option<PathBuf>,

    /// Prefer the local socket over TCP for the runtime collector.
    #[arg(long, default_value_t = false)]
    pub crio_prefer_unix_socket: bool,

    /// Which collectors run and which endpoints are mounted.
    #[arg(long, value_enum, default_value_t = ModeArg::Profiling)]
    pub mode: ModeArg,

    /// Script body for the script collector (scripting mode only).
    #[arg(long, env = "EXECUTE_SCRIPT")]
    pub execute_script: Option<String>,

    /// Log filter, passed to `tracing_subscriber::EnvFilter` (overridden
    /// by `RUST_LOG` if set).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Profiling,
    Scripting,
}

impl From<ModeArg> for noa_engine::Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Profiling => noa_engine::Mode::Profiling,
            ModeArg::Scripting => noa_engine::Mode::Scripting,
        }
    }
}

/// A fully validated, ready-to-run configuration. Produced only by
/// [`Cli::validate`], which performs every pre-flight check named in the
/// external interface contract.
pub struct ValidatedConfig {
    pub port: u16,
    pub unix_socket: Option<PathBuf>,
    pub prefer_unix_socket: bool,
    pub storage: PathBuf,
    pub mode: noa_engine::Mode,
    pub collectors: noa_engine::Collectors,
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--node-ip/NODE_IP is required in profiling mode")]
    MissingNodeIp,
    #[error("NODE_IP {0:?} is not a valid IP address")]
    InvalidNodeIp(String),
    #[error("--token-file is required in profiling mode")]
    MissingTokenFile,
    #[error("reading token file {path:?}: {source}")]
    TokenFile { path: PathBuf, #[source] source: std::io::Error },
    #[error("token file {0:?} is empty")]
    EmptyToken(PathBuf),
    #[error("--ca-file is required in profiling mode")]
    MissingCaFile,
    #[error("reading CA file {path:?}: {source}")]
    CaFile { path: PathBuf, #[source] source: std::io::Error },
    #[error("--crio-socket is required when --crio-prefer-unix-socket is set")]
    MissingCrioSocket,
    #[error("CRI-O socket {0:?} is not accessible: {1}")]
    CrioSocketInaccessible(PathBuf, std::io::Error),
    #[error("storage folder {0:?} is not accessible: {1}")]
    StorageInaccessible(PathBuf, std::io::Error),
    #[error("EXECUTE_SCRIPT is required in scripting mode")]
    MissingScript,
}

impl Cli {
    /// Run every pre-flight check named in the external interface
    /// contract, exiting non-zero with a diagnostic on the first
    /// failure (mirroring the original agent's `checkParameters`).
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        check_storage_folder(&self.storage)?;

        let collectors = match self.mode {
            ModeArg::Profiling => {
                let node_ip = self.node_ip.ok_or(ConfigError::MissingNodeIp)?;
                node_ip
                    .parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidNodeIp(node_ip.clone()))?;

                let token_path = self.token_file.ok_or(ConfigError::MissingTokenFile)?;
                let token = read_non_empty(&token_path)
                    .map_err(|source| ConfigError::TokenFile { path: token_path.clone(), source })?;
                if token.trim().is_empty() {
                    return Err(ConfigError::EmptyToken(token_path));
                }

                let ca_path = self.ca_file.ok_or(ConfigError::MissingCaFile)?;
                let ca_certs = std::fs::read(&ca_path)
                    .map_err(|source| ConfigError::CaFile { path: ca_path, source })?;

                if self.crio_prefer_unix_socket && self.crio_socket.is_none() {
                    return Err(ConfigError::MissingCrioSocket);
                }
                if let Some(socket) = &self.crio_socket {
                    check_crio_socket(socket)?;
                }

                noa_engine::Collectors::Profiling {
                    kubelet: noa_collectors::KubeletConfig {
                        node_ip,
                        token: token.trim().into(),
                        ca_certs: ca_certs.into(),
                        storage_folder: self.storage.clone(),
                    },
                    runtime: noa_collectors::RuntimeConfig {
                        crio_unix_socket: self.crio_socket.clone(),
                        crio_prefer_unix_socket: self.crio_prefer_unix_socket,
                        storage_folder: self.storage.clone(),
                    },
                }
            }
            ModeArg::Scripting => {
                let script = self.execute_script.ok_or(ConfigError::MissingScript)?;
                noa_engine::Collectors::Scripting { script: script.into() }
            }
        };

        Ok(ValidatedConfig {
            port: self.port,
            unix_socket: self.unix_socket,
            prefer_unix_socket: self.prefer_unix_socket,
            storage: self.storage,
            mode: self.mode.into(),
            collectors,
            log_level: self.log_level,
        })
    }
}

fn read_non_empty(path: &std::path::Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

fn check_storage_folder(path: &std::path::Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path)
        .and_then(|()| std::fs::metadata(path).map(|_| ()))
        .map_err(|err| ConfigError::StorageInaccessible(path.to_path_buf(), err))
}

fn check_crio_socket(path: &std::path::Path) -> Result<(), ConfigError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|err| ConfigError::CrioSocketInaccessible(path.to_path_buf(), err))
}
