//! Upgrade the components nodeadm installed.

use anyhow::{Context, Result};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::components::{self, InstallEnv};

/// Upgrade every tracked component in install order.
///
/// # Errors
///
/// Fails if nothing is tracked, or at the first component that fails.
pub async fn upgrade(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
) -> Result<()> {
    let installed = env.tracker.installed();
    if installed.is_empty() {
        anyhow::bail!("nothing was installed by nodeadm; run `nodeadm install` first");
    }
    for name in installed {
        tracing::info!(artifact = %name, "upgrading");
        components::upgrade(env, name)
            .await
            .with_context(|| format!("upgrading {name}"))?;
    }
    tracing::info!("upgrade complete");
    Ok(())
}
