//! The host's package manager as a `PackageProvider`.
//!
//! Verbs differ between apt and yum; each manager gets its own
//! [`PackageManagerVerbs`] table, built once and handed to
//! [`DistroPackageManager`].

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::{DockerRepoLayout, PackageProvider};
use crate::domain::{Cmd, PackageManagerKind, PackageSource};

const SSM_PACKAGE: &str = "amazon-ssm-agent";

const DOCKER_GPG_KEY_URL: &str = "https://download.docker.com/linux/ubuntu/gpg";
const DOCKER_GPG_KEY_PATH: &str = "/etc/apt/keyrings/docker.asc";
const DOCKER_APT_REPO: &str = "https://download.docker.com/linux/ubuntu";
const DOCKER_APT_SOURCE_LIST: &str = "/etc/apt/sources.list.d/docker.list";
const DOCKER_YUM_REPO_URL: &str = "https://download.docker.com/linux/centos/docker-ce.repo";
const DOCKER_YUM_REPO_PATH: &str = "/etc/yum.repos.d/docker-ce.repo";

/// Verbs one package manager uses for each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerVerbs {
    pub kind: PackageManagerKind,
    pub install: &'static str,
    pub upgrade: &'static str,
    pub remove: &'static str,
    pub refresh_metadata: &'static str,
}

impl PackageManagerVerbs {
    #[must_use]
    pub fn apt() -> Self {
        Self {
            kind: PackageManagerKind::Apt,
            install: "install",
            upgrade: "update",
            remove: "autoremove",
            refresh_metadata: "update",
        }
    }

    #[must_use]
    pub fn yum() -> Self {
        Self {
            kind: PackageManagerKind::Yum,
            install: "install",
            upgrade: "update",
            remove: "remove",
            refresh_metadata: "makecache",
        }
    }

    #[must_use]
    pub fn for_kind(kind: PackageManagerKind) -> Self {
        match kind {
            PackageManagerKind::Apt => Self::apt(),
            PackageManagerKind::Yum => Self::yum(),
        }
    }
}

/// apt or yum, with the host facts their commands depend on.
#[derive(Debug, Clone)]
pub struct DistroPackageManager {
    verbs: PackageManagerVerbs,
    /// Debian-style architecture, e.g. `amd64`.
    arch: &'static str,
    /// `VERSION_CODENAME` from os-release, used by Docker's apt repository.
    codename: String,
    /// runc from the distro is installed and blocks Docker's containerd.io.
    runc_installed: bool,
}

impl DistroPackageManager {
    #[must_use]
    pub fn new(
        verbs: PackageManagerVerbs,
        arch: &'static str,
        codename: impl Into<String>,
    ) -> Self {
        Self {
            verbs,
            arch,
            codename: codename.into(),
            runc_installed: false,
        }
    }

    #[must_use]
    pub fn with_runc_installed(mut self, installed: bool) -> Self {
        self.runc_installed = installed;
        self
    }

    /// Detect the package manager on `PATH` and read the OS codename.
    ///
    /// yum is preferred when both are present.
    ///
    /// # Errors
    ///
    /// Returns an error if neither apt nor yum is installed.
    pub fn detect(arch: &'static str) -> Result<Self> {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let dirs: Vec<PathBuf> = std::env::split_paths(&path).collect();
        let kind = detect_kind(&dirs).ok_or_else(|| {
            anyhow::anyhow!("unsupported package manager: neither yum nor apt found on PATH")
        })?;
        let codename = std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| os_release_codename(&content))
            .unwrap_or_default();
        let runc_installed = on_path(&dirs, "runc");
        tracing::debug!(
            manager = %kind,
            codename = %codename,
            runc_installed,
            "detected package manager"
        );
        Ok(Self::new(PackageManagerVerbs::for_kind(kind), arch, codename)
            .with_runc_installed(runc_installed))
    }

    /// Where Docker's repository artifact is fetched from for this manager.
    #[must_use]
    pub fn docker_repo_url(&self) -> &'static str {
        match self.verbs.kind {
            PackageManagerKind::Apt => DOCKER_GPG_KEY_URL,
            PackageManagerKind::Yum => DOCKER_YUM_REPO_URL,
        }
    }

    fn package(&self, name: &str) -> PackageSource {
        let manager = self.verbs.kind.binary();
        PackageSource::new(
            Cmd::new(manager, [self.verbs.install, name, "-y"]),
            Cmd::new(manager, [self.verbs.remove, name, "-y"]),
            Cmd::new(manager, [self.verbs.upgrade, name, "-y"]),
        )
    }
}

/// The first supported package manager found in `dirs`.
fn detect_kind(dirs: &[PathBuf]) -> Option<PackageManagerKind> {
    [PackageManagerKind::Yum, PackageManagerKind::Apt]
        .into_iter()
        .find(|kind| on_path(dirs, kind.binary()))
}

fn on_path(dirs: &[PathBuf], binary: &str) -> bool {
    dirs.iter().any(|d| is_executable(&d.join(binary)))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

/// `VERSION_CODENAME` from an os-release document.
#[must_use]
pub fn os_release_codename(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.trim().strip_prefix("VERSION_CODENAME=")?;
        let value = value.trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

impl PackageProvider for DistroPackageManager {
    fn kind(&self) -> PackageManagerKind {
        self.verbs.kind
    }

    fn containerd(&self, docker: bool) -> PackageSource {
        self.package(if docker { "containerd.io" } else { "containerd" })
    }

    fn iptables(&self) -> PackageSource {
        self.package("iptables")
    }

    /// On apt hosts the agent is a snap.
    fn ssm(&self) -> PackageSource {
        match self.verbs.kind {
            PackageManagerKind::Apt => PackageSource::new(
                Cmd::new("snap", ["install", SSM_PACKAGE]),
                Cmd::new("snap", ["remove", SSM_PACKAGE]),
                Cmd::new("snap", ["refresh", SSM_PACKAGE]),
            ),
            PackageManagerKind::Yum => self.package(SSM_PACKAGE),
        }
    }

    fn refresh_metadata(&self) -> Cmd {
        Cmd::new(self.verbs.kind.binary(), [self.verbs.refresh_metadata])
    }

    fn docker_repo(&self) -> DockerRepoLayout {
        match self.verbs.kind {
            PackageManagerKind::Apt => DockerRepoLayout {
                fetched_path: DOCKER_GPG_KEY_PATH,
                source_list: Some((
                    DOCKER_APT_SOURCE_LIST,
                    format!(
                        "deb [arch={} signed-by={DOCKER_GPG_KEY_PATH}] {DOCKER_APT_REPO} {} stable\n",
                        self.arch, self.codename
                    ),
                )),
                conflicts: None,
                prerequisite: self.package("ca-certificates"),
                refresh: Cmd::new(
                    "apt",
                    [
                        "update",
                        "-y",
                        "-o",
                        "Dir::Etc::sourcelist=/etc/apt/sources.list.d/docker.list",
                    ],
                ),
            },
            PackageManagerKind::Yum => DockerRepoLayout {
                fetched_path: DOCKER_YUM_REPO_PATH,
                source_list: None,
                conflicts: self.runc_installed.then(|| self.package("runc")),
                prerequisite: self.package("yum-utils"),
                refresh: self.refresh_metadata(),
            },
        }
    }
}
