//! kubelet binary and its systemd unit, tracked as one component.

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::components::InstallEnv;
use crate::application::services::components::file::{FileComponent, FileOrigin};
use crate::domain::{ArtifactName, Asset};

pub const BINARY: FileComponent = FileComponent {
    artifact: ArtifactName::Kubelet,
    origin: FileOrigin::Remote,
    path: "/usr/bin/kubelet",
    mode: 0o755,
    remove: "/usr/bin/kubelet",
};

pub const UNIT: FileComponent = FileComponent {
    artifact: ArtifactName::Kubelet,
    origin: FileOrigin::Embedded(Asset::KubeletUnit),
    path: "/etc/systemd/system/kubelet.service",
    mode: 0o644,
    remove: "/etc/systemd/system/kubelet.service",
};

/// Generated kubelet configuration, including the environment file.
pub const CONFIG_DIR: &str = "/etc/eks/kubelet";

pub async fn install(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    BINARY.put(env).await?;
    UNIT.put(env).await?;
    env.tracker.add(ArtifactName::Kubelet)
}

/// Replace the binary if a new one is available. The unit file is
/// rewritten alongside it.
pub async fn upgrade(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    if BINARY.upgrade(env).await? {
        UNIT.put(env).await?;
    }
    Ok(())
}

pub fn uninstall(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    for path in [BINARY.remove, UNIT.remove, CONFIG_DIR] {
        env.fs
            .remove_all(path)
            .with_context(|| format!("removing {path}"))?;
    }
    Ok(())
}
