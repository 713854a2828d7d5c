//! Install every component a hybrid node needs, in dependency order.
//!
//! Components already recorded in the tracker are skipped, so an install
//! interrupted halfway resumes where it stopped.

use anyhow::{Context, Result};
use nodeadm_common::{ContainerdSource, CredentialProvider};

use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::components::{
    IAM_AUTHENTICATOR, IAM_ROLES_ANYWHERE, IMAGE_CREDENTIAL_PROVIDER, InstallEnv, KUBECTL,
    containerd, docker_repo, iptables, kubelet, ssm,
};
use crate::domain::ArtifactName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub credential_provider: CredentialProvider,
    pub containerd_source: ContainerdSource,
    /// Region the SSM agent registers in.
    pub region: String,
}

/// Components to install for `opts`, in order.
#[must_use]
pub fn plan(opts: &InstallOptions) -> Vec<ArtifactName> {
    let mut steps = vec![ArtifactName::DockerRepo];
    if opts.containerd_source != ContainerdSource::None {
        steps.push(ArtifactName::Containerd);
    }
    steps.extend([
        ArtifactName::Iptables,
        ArtifactName::Kubelet,
        ArtifactName::Kubectl,
        ArtifactName::ImageCredentialProvider,
        ArtifactName::IamAuthenticator,
    ]);
    steps.push(match opts.credential_provider {
        CredentialProvider::Ssm => ArtifactName::Ssm,
        CredentialProvider::IamRolesAnywhere => ArtifactName::IamRolesAnywhere,
    });
    steps
}

async fn install_component(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    name: ArtifactName,
    opts: &InstallOptions,
) -> Result<()> {
    match name {
        ArtifactName::DockerRepo => docker_repo::install(env, opts.containerd_source).await,
        ArtifactName::Containerd => containerd::install(env, opts.containerd_source).await,
        ArtifactName::Iptables => iptables::install(env).await,
        ArtifactName::Kubelet => kubelet::install(env).await,
        ArtifactName::Kubectl => KUBECTL.install(env).await,
        ArtifactName::ImageCredentialProvider => IMAGE_CREDENTIAL_PROVIDER.install(env).await,
        ArtifactName::IamAuthenticator => IAM_AUTHENTICATOR.install(env).await,
        ArtifactName::IamRolesAnywhere => IAM_ROLES_ANYWHERE.install(env).await,
        ArtifactName::Ssm => ssm::install(env, &opts.region).await,
    }
}

/// Install all components for `opts`.
///
/// # Errors
///
/// Stops at the first component that fails. Components installed before
/// it stay installed and tracked.
pub async fn install(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    opts: &InstallOptions,
) -> Result<()> {
    for name in plan(opts) {
        if env.tracker.contains(name) {
            tracing::info!(artifact = %name, "already installed, skipping");
            continue;
        }
        tracing::info!(artifact = %name, "installing");
        install_component(env, name, opts)
            .await
            .with_context(|| format!("installing {name}"))?;
    }
    tracing::info!("install complete");
    Ok(())
}
