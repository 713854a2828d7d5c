//! Remove what nodeadm installed, newest first.

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::components::{self, InstallEnv};
use crate::domain::ArtifactName;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Leave containerd and the repository it came from in place.
    pub skip_containerd: bool,
}

/// Uninstall tracked components in reverse install order, untracking each
/// one as it goes. The tracker record is deleted once nothing is left.
///
/// # Errors
///
/// Stops at the first component that fails to uninstall; it and everything
/// older stay tracked.
pub async fn uninstall(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    opts: UninstallOptions,
) -> Result<()> {
    for name in env.tracker.uninstall_order() {
        let kept = matches!(name, ArtifactName::Containerd | ArtifactName::DockerRepo);
        if opts.skip_containerd && kept {
            tracing::info!(artifact = %name, "skipping removal");
            continue;
        }
        tracing::info!(artifact = %name, "uninstalling");
        components::uninstall(env, name)
            .await
            .with_context(|| format!("uninstalling {name}"))?;
        env.tracker.remove(name)?;
    }
    if env.tracker.installed().is_empty() {
        env.tracker.clear()?;
    }
    tracing::info!("uninstall complete");
    Ok(())
}
