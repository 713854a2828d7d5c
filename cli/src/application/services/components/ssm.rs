//! AWS Systems Manager agent, installed through Amazon's setup CLI.

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::artifact::{
    uninstall_package_with_retries, upgrade_package_with_retries,
};
use crate::application::services::components::InstallEnv;
use crate::application::services::components::file::{FileComponent, FileOrigin};
use crate::application::services::retry::retry;
use crate::domain::{ArtifactName, Cmd};

pub const INSTALLER: FileComponent = FileComponent {
    artifact: ArtifactName::Ssm,
    origin: FileOrigin::Remote,
    path: "/opt/ssm/ssm-setup-cli",
    mode: 0o755,
    remove: "/opt/ssm",
};

/// Download the setup CLI and let it install the agent for `region`.
pub async fn install(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    region: &str,
) -> Result<()> {
    INSTALLER.put(env).await?;
    let installer = env.fs.resolve(INSTALLER.path).display().to_string();
    retry(
        env.ctx,
        env.runner,
        || Cmd::new(installer.as_str(), ["-install", "-region", region]),
        env.retry_interval,
    )
    .await
    .context("running ssm installer")?;
    env.tracker.add(ArtifactName::Ssm)
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
    upgrade_package_with_retries(env.ctx, env.runner, &env.packages.ssm(), env.retry_interval)
        .await
        .context("upgrading ssm agent")?;
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
    uninstall_package_with_retries(env.ctx, env.runner, &env.packages.ssm(), env.retry_interval)
        .await
        .context("uninstalling ssm agent")?;
    env.fs
        .remove_all(INSTALLER.remove)
        .context("removing ssm installer")
}
