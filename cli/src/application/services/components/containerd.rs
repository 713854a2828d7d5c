//! containerd from the distribution or Docker's repository.

use anyhow::{Context, Result};
use nodeadm_common::ContainerdSource;

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::artifact::{
    install_package_with_retries, uninstall_package_with_retries, upgrade_package_with_retries,
};
use crate::application::services::components::InstallEnv;
use crate::application::services::components::file::{FileComponent, FileOrigin};
use crate::domain::{ArtifactName, Asset};

/// Kernel modules containerd needs at boot.
pub const MODULES_CONF: FileComponent = FileComponent {
    artifact: ArtifactName::Containerd,
    origin: FileOrigin::Embedded(Asset::ContainerdModules),
    path: "/etc/modules-load.d/containerd.conf",
    mode: 0o644,
    remove: "/etc/modules-load.d/containerd.conf",
};

pub const CONFIG_DIR: &str = "/etc/containerd";

/// Install containerd from `source`. `ContainerdSource::None` leaves the
/// host alone and records nothing.
pub async fn install(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    source: ContainerdSource,
) -> Result<()> {
    if source == ContainerdSource::None {
        tracing::info!("containerd source is none, skipping containerd");
        return Ok(());
    }
    let pkg = env.packages.containerd(source == ContainerdSource::Docker);
    install_package_with_retries(env.ctx, env.runner, &pkg, env.retry_interval)
        .await
        .context("installing containerd")?;
    MODULES_CONF.put(env).await?;
    env.tracker.add(ArtifactName::Containerd)
}

pub async fn upgrade(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    let docker = env.tracker.contains(ArtifactName::DockerRepo);
    let pkg = env.packages.containerd(docker);
    upgrade_package_with_retries(env.ctx, env.runner, &pkg, env.retry_interval)
        .await
        .context("upgrading containerd")?;
    Ok(())
}

pub async fn uninstall(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    let docker = env.tracker.contains(ArtifactName::DockerRepo);
    let pkg = env.packages.containerd(docker);
    uninstall_package_with_retries(env.ctx, env.runner, &pkg, env.retry_interval)
        .await
        .context("uninstalling containerd")?;
    env.fs
        .remove_all(MODULES_CONF.path)
        .context("removing containerd module config")?;
    env.fs
        .remove_all(CONFIG_DIR)
        .context("removing containerd config directory")
}
