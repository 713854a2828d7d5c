//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the application's own
//! context type, never from `crate::infra` or `crate::commands`.

use std::io::Read;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;

use crate::application::context::OpContext;
use crate::domain::{
    ArtifactName, Asset, Cmd, CommandError, InstallFileError, PackageManagerKind, PackageSource,
    Source, TrackerState,
};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `cmd` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// `CommandError::Launch` if the process cannot be started and
    /// `CommandError::Interrupted` if `ctx` finishes first. On interruption
    /// the child process must be killed, not left orphaned. A non-zero exit
    /// is not an error here; see [`check_status`].
    async fn run(&self, ctx: &OpContext, cmd: &Cmd) -> Result<Output, CommandError>;
}

/// Turn a non-zero exit into `CommandError::Failed`.
pub fn check_status(cmd: &Cmd, output: Output) -> Result<Output, CommandError> {
    if output.status.success() {
        return Ok(output);
    }
    Err(CommandError::Failed {
        cmd: cmd.to_string(),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

// ── Artifact Source Port ──────────────────────────────────────────────────────

/// Where file artifacts come from.
#[allow(async_fn_in_trait)]
pub trait ArtifactSource {
    /// Open a fresh stream for a downloadable artifact.
    async fn get(&self, ctx: &OpContext, name: ArtifactName) -> Result<Source>;

    /// Open a file compiled into the binary.
    fn asset(&self, asset: Asset) -> Result<Source>;
}

// ── Package Provider Port ─────────────────────────────────────────────────────

/// Files and commands that put Docker's package repository on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerRepoLayout {
    /// Where the fetched `DockerRepo` artifact is written (signing key or
    /// repo definition).
    pub fetched_path: &'static str,
    /// An extra source list written verbatim, if the manager needs one.
    pub source_list: Option<(&'static str, String)>,
    /// Installed package that conflicts with Docker's containerd and is
    /// removed first.
    pub conflicts: Option<PackageSource>,
    /// Package that must be present before the repository can be used.
    pub prerequisite: PackageSource,
    /// Refreshes metadata for the new repository.
    pub refresh: Cmd,
}

/// Commands for packages managed by the host's package manager.
pub trait PackageProvider {
    fn kind(&self) -> PackageManagerKind;
    /// containerd, from Docker's repository when `docker` is set.
    fn containerd(&self, docker: bool) -> PackageSource;
    fn iptables(&self) -> PackageSource;
    fn ssm(&self) -> PackageSource;
    /// Refreshes the distribution's package metadata.
    fn refresh_metadata(&self) -> Cmd;
    fn docker_repo(&self) -> DockerRepoLayout;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Host filesystem addressed by absolute node paths such as `/usr/bin/kubelet`.
///
/// Implementations may place those paths under a different root.
pub trait NodeFilesystem {
    /// The real location of a node path.
    fn resolve(&self, path: &str) -> PathBuf;

    /// Atomically write `src` to `path` with permission bits `mode`,
    /// creating missing parent directories.
    fn install_file(
        &self,
        path: &str,
        src: &mut dyn Read,
        mode: u32,
    ) -> Result<(), InstallFileError>;

    fn write_file(&self, path: &str, contents: &[u8], mode: u32) -> Result<(), InstallFileError> {
        self.install_file(path, &mut &contents[..], mode)
    }

    /// Whether installing `src` at `path` would change anything.
    fn upgrade_available(&self, path: &str, src: &Source) -> Result<bool>;

    /// Remove a file or directory tree. Absent paths are not an error.
    fn remove_all(&self, path: &str) -> Result<()>;

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

// ── Tracker Store Port ────────────────────────────────────────────────────────

/// Durable storage for the installation tracker.
pub trait TrackerStore: Send + Sync {
    /// Load the stored state, returning `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<TrackerState>>;
    fn save(&self, state: &TrackerState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

// ── Host Network Port ─────────────────────────────────────────────────────────

/// Read-only view of the host's network configuration.
#[allow(async_fn_in_trait)]
pub trait HostNetwork {
    /// Every address bound to a local interface.
    fn interface_addrs(&self) -> std::io::Result<Vec<IpAddr>>;

    /// Resolve `name` through the system resolver.
    async fn lookup_ip(&self, name: &str) -> std::io::Result<Vec<IpAddr>>;

    /// The IPv4 address of the interface carrying the default route.
    fn default_route_addr(&self) -> std::io::Result<Option<Ipv4Addr>>;
}
