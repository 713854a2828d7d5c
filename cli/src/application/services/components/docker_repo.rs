//! Package repository setup that must happen before containerd.

use anyhow::{Context, Result};
use nodeadm_common::ContainerdSource;

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::artifact::{
    install_package_with_retries, uninstall_package_with_retries,
};
use crate::application::services::components::InstallEnv;
use crate::application::services::retry::retry;
use crate::domain::{ArtifactName, PackageManagerKind};

const REPO_FILE_MODE: u32 = 0o644;

/// Prepare the package manager for `source`.
///
/// For Docker this removes packages that conflict with `containerd.io`,
/// installs the prerequisite package, adds Docker's
/// repository and refreshes it, and records `docker-repo`. apt hosts
/// installing from the distribution only get a metadata refresh, which is
/// not recorded.
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
    match source {
        ContainerdSource::Docker => add_docker_repo(env).await,
        ContainerdSource::Distro if env.packages.kind() == PackageManagerKind::Apt => {
            retry(
                env.ctx,
                env.runner,
                || env.packages.refresh_metadata(),
                env.retry_interval,
            )
            .await
            .context("refreshing package metadata")?;
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn add_docker_repo(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    let layout = env.packages.docker_repo();
    if let Some(conflict) = &layout.conflicts {
        uninstall_package_with_retries(env.ctx, env.runner, conflict, env.retry_interval)
            .await
            .context("removing packages that conflict with containerd.io")?;
    }
    install_package_with_retries(env.ctx, env.runner, &layout.prerequisite, env.retry_interval)
        .await
        .context("installing docker repository prerequisites")?;

    let mut src = env
        .sources
        .get(env.ctx, ArtifactName::DockerRepo)
        .await
        .context("getting docker repository source")?;
    env.fs
        .install_file(layout.fetched_path, &mut env.ctx.reader(&mut src), REPO_FILE_MODE)
        .context("installing docker repository")?;
    drop(src);

    if let Some((path, contents)) = &layout.source_list {
        env.fs
            .write_file(path, contents.as_bytes(), REPO_FILE_MODE)
            .context("writing docker source list")?;
    }

    retry(
        env.ctx,
        env.runner,
        || layout.refresh.clone(),
        env.retry_interval,
    )
    .await
    .context("refreshing docker repository metadata")?;
    tracing::info!(manager = %env.packages.kind(), "added docker package repository");
    env.tracker.add(ArtifactName::DockerRepo)
}

/// Remove the repository files. Absent files are fine.
pub fn uninstall(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    let layout = env.packages.docker_repo();
    env.fs
        .remove_all(layout.fetched_path)
        .context("removing docker repository")?;
    if let Some((path, _)) = &layout.source_list {
        env.fs
            .remove_all(path)
            .context("removing docker source list")?;
    }
    Ok(())
}
