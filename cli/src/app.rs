//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once from the agent settings and the root
//! operation context, and hands each command the host implementations of
//! the application ports.

use anyhow::Result;

use crate::application::context::OpContext;
use crate::application::ports::PackageProvider;
use crate::application::services::tracker::Tracker;
use crate::domain::PackageManagerKind;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::Settings;
use crate::infra::fs::HostFs;
use crate::infra::package_manager::DistroPackageManager;
use crate::infra::source::{NodeSources, ReleaseSource, SsmInstallerSource, host_arch};
use crate::infra::tracker::FileTrackerStore;

/// Unified application context passed to every command handler.
pub struct AppContext {
    pub settings: Settings,
    /// Root context; cancelled on Ctrl-C.
    pub ctx: OpContext,
    pub runner: TokioCommandRunner,
    pub fs: HostFs,
}

impl AppContext {
    #[must_use]
    pub fn new(settings: Settings, ctx: OpContext) -> Self {
        let fs = HostFs::with_root(settings.install_root.clone());
        Self {
            settings,
            ctx,
            runner: TokioCommandRunner,
            fs,
        }
    }

    /// Changing the live host requires root. Installs under another root
    /// (image preparation, tests) do not.
    ///
    /// # Errors
    ///
    /// Returns an error when targeting `/` without root privileges.
    pub fn ensure_root(&self) -> Result<()> {
        if self.settings.is_host_root() && !nix::unistd::geteuid().is_root() {
            anyhow::bail!("nodeadm must be run as root to modify this host");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the tracker exists but cannot be read.
    pub fn tracker(&self) -> Result<Tracker> {
        let store = FileTrackerStore::with_path(self.settings.tracker_file());
        Tracker::load(Box::new(store))
    }

    /// # Errors
    ///
    /// Returns an error if the host has no supported package manager or
    /// architecture.
    pub fn packages(&self) -> Result<DistroPackageManager> {
        DistroPackageManager::detect(host_arch()?)
    }

    /// Download sources for one Kubernetes version.
    ///
    /// # Errors
    ///
    /// Returns an error on an unsupported architecture.
    pub fn sources(
        &self,
        kubernetes_version: semver::Version,
        region: &str,
        packages: &DistroPackageManager,
    ) -> Result<NodeSources> {
        let arch = host_arch()?;
        let variant = match packages.kind() {
            PackageManagerKind::Apt => "debian",
            PackageManagerKind::Yum => "linux",
        };
        Ok(NodeSources {
            release: ReleaseSource::new(&self.settings.release_base_url, kubernetes_version, arch),
            ssm: SsmInstallerSource::new(region, variant, arch),
            docker_repo_url: packages.docker_repo_url().to_string(),
        })
    }
}
