//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application` or `tokio`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator,
//! so callers can recover them with `downcast_ref`.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::artifact::ArtifactName;

// ── Operation context ─────────────────────────────────────────────────────────

/// Why an operation context stopped accepting work.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Failure of a single command execution.
///
/// `cmd` is the rendered command line, e.g. `[apt install -y iptables]`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("running command {cmd}: {source}")]
    Launch {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("running command {cmd}: waiting for process: {source}")]
    Wait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("running command {cmd}: {status}: {stderr}")]
    Failed {
        cmd: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("running command {cmd}: {reason}")]
    Interrupted { cmd: String, reason: ContextError },
}

/// The retry loop stopped because its context was cancelled or its deadline
/// passed. Carries the last command failure so the caller can report it.
#[derive(Debug)]
pub struct RetryInterrupted {
    pub reason: ContextError,
    pub attempts: u32,
    pub last_error: Option<CommandError>,
}

impl fmt::Display for RetryInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} attempt(s)", self.reason, self.attempts)?;
        if let Some(last) = &self.last_error {
            write!(f, ", last error: {last}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RetryInterrupted {}

// ── Artifacts ─────────────────────────────────────────────────────────────────

/// Failure while placing a file artifact on disk. Each variant names the
/// step that failed.
#[derive(Debug, Error)]
pub enum InstallFileError {
    #[error("creating directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("publishing {path}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The bytes read through a source do not hash to the expected digest.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{artifact} checksum mismatch: expected {expected}, got {actual}")]
pub struct ChecksumError {
    pub artifact: ArtifactName,
    pub expected: String,
    pub actual: String,
}

// ── Node IP ───────────────────────────────────────────────────────────────────

/// Errors raised while determining or validating the node IP.
#[derive(Debug, Error)]
pub enum NodeIpError {
    #[error(
        "hostname-override kubelet flag is not supported for hybrid nodes but found override: {0}"
    )]
    HostnameOverrideUnsupported(String),

    #[error("invalid ip {0} in --node-ip flag. only 1 IPv4 address is allowed")]
    InvalidNodeIpFlag(String),

    #[error("invalid IPv6 address {0} in --node-ip flag. only IPv4 is supported")]
    Ipv6NodeIpFlag(String),

    #[error("nodeIP can't be loopback address: {0}")]
    Loopback(IpAddr),

    #[error("nodeIP can't be a multicast address: {0}")]
    Multicast(IpAddr),

    #[error("nodeIP can't be a link-local unicast address: {0}")]
    LinkLocal(IpAddr),

    #[error("nodeIP can't be an all zeros address")]
    Unspecified,

    #[error("node IP: \"{0}\" not found in the host's network interfaces")]
    NotOnHost(IpAddr),

    #[error("listing host network interfaces")]
    Interfaces(#[source] std::io::Error),

    #[error("couldn't get ip address of node: {0}")]
    NoNodeIp(String),
}

/// Errors raised while checking the node IP against the cluster's remote
/// node networks.
#[derive(Debug, Error)]
pub enum NetworkValidationError {
    #[error("remote network config is not set for the cluster")]
    MissingRemoteNetworkConfig,

    #[error("remote network config has no remote node networks")]
    NoRemoteNodeNetworks,

    #[error("remote node network {index} has no CIDR blocks")]
    EmptyRemoteNodeNetwork { index: usize },

    #[error("error checking IP in CIDR {cidr}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error(
        "node IP {ip} is not in any of the remote network CIDR blocks: [{}]; \
         use .spec.kubelet.flags field in config-source yaml to set node-ip \
         to an IP within one of these CIDR blocks \
         (e.g. --node-ip=10.0.0.1) or use --skip ip-validation",
        .cidrs.join(" ")
    )]
    NotInRemoteNodeNetworks { ip: Ipv4Addr, cidrs: Vec<String> },
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Errors related to locating and reading agent configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported config source '{0}'. Expected file://<path> or a local path.")]
    UnsupportedSource(String),

    #[error("invalid kubernetes version '{0}'. Expected MAJOR.MINOR or MAJOR.MINOR.PATCH.")]
    InvalidKubernetesVersion(String),

    #[error("only hybrid nodes can be initialized; set spec.hybrid in the node config")]
    NotHybridNode,
}
