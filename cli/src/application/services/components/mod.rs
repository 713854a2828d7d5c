//! Component installers.
//!
//! Each component knows its on-disk layout and how to install, upgrade and
//! remove itself. Components are recorded in the tracker only after a
//! successful install.

pub mod containerd;
pub mod docker_repo;
pub mod file;
pub mod iptables;
pub mod kubelet;
pub mod ssm;

use std::time::Duration;

use anyhow::Result;

use crate::application::context::OpContext;
use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::tracker::Tracker;
use crate::domain::ArtifactName;

pub use file::{
    FileComponent, IAM_AUTHENTICATOR, IAM_ROLES_ANYWHERE, IMAGE_CREDENTIAL_PROVIDER, KUBECTL,
};

/// Everything a component needs to touch the node.
pub struct InstallEnv<'a, R, S, F, P> {
    pub ctx: &'a OpContext,
    pub runner: &'a R,
    pub sources: &'a S,
    pub fs: &'a F,
    pub packages: &'a P,
    pub tracker: &'a Tracker,
    pub retry_interval: Duration,
}

/// Upgrade one tracked component.
pub async fn upgrade(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    name: ArtifactName,
) -> Result<()> {
    match name {
        ArtifactName::DockerRepo => Ok(()),
        ArtifactName::Containerd => containerd::upgrade(env).await,
        ArtifactName::Iptables => iptables::upgrade(env).await,
        ArtifactName::Kubelet => kubelet::upgrade(env).await,
        ArtifactName::Kubectl => KUBECTL.upgrade(env).await.map(|_| ()),
        ArtifactName::ImageCredentialProvider => {
            IMAGE_CREDENTIAL_PROVIDER.upgrade(env).await.map(|_| ())
        }
        ArtifactName::IamAuthenticator => IAM_AUTHENTICATOR.upgrade(env).await.map(|_| ()),
        ArtifactName::IamRolesAnywhere => IAM_ROLES_ANYWHERE.upgrade(env).await.map(|_| ()),
        ArtifactName::Ssm => ssm::upgrade(env).await,
    }
}

/// Remove one tracked component from the node.
pub async fn uninstall(
    env: &InstallEnv<
        '_,
        impl CommandRunner,
        impl ArtifactSource,
        impl NodeFilesystem,
        impl PackageProvider,
    >,
    name: ArtifactName,
) -> Result<()> {
    match name {
        ArtifactName::DockerRepo => docker_repo::uninstall(env),
        ArtifactName::Containerd => containerd::uninstall(env).await,
        ArtifactName::Iptables => iptables::uninstall(env).await,
        ArtifactName::Kubelet => kubelet::uninstall(env),
        ArtifactName::Kubectl => KUBECTL.uninstall(env),
        ArtifactName::ImageCredentialProvider => IMAGE_CREDENTIAL_PROVIDER.uninstall(env),
        ArtifactName::IamAuthenticator => IAM_AUTHENTICATOR.uninstall(env),
        ArtifactName::IamRolesAnywhere => IAM_ROLES_ANYWHERE.uninstall(env),
        ArtifactName::Ssm => ssm::uninstall(env).await,
    }
}
