//! iptables from the host package manager.

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::artifact::{
    install_package_with_retries, uninstall_package_with_retries, upgrade_package_with_retries,
};
use crate::application::services::components::InstallEnv;
use crate::domain::ArtifactName;

pub async fn install(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    install_package_with_retries(env.ctx, env.runner, &env.packages.iptables(), env.retry_interval)
        .await
        .context("installing iptables")?;
    env.tracker.add(ArtifactName::Iptables)
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
    upgrade_package_with_retries(env.ctx, env.runner, &env.packages.iptables(), env.retry_interval)
        .await
        .context("upgrading iptables")?;
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
    uninstall_package_with_retries(
        env.ctx,
        env.runner,
        &env.packages.iptables(),
        env.retry_interval,
    )
    .await
    .context("uninstalling iptables")?;
    Ok(())
}
