//! Components that are a single file on disk.

use anyhow::{Context, Result};

use crate::application::context::OpContext;
use crate::application::ports::{ArtifactSource, CommandRunner, NodeFilesystem, PackageProvider};
use crate::application::services::components::InstallEnv;
use crate::domain::{ArtifactName, Asset, Source};

/// Where a file component's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    /// Downloaded through [`ArtifactSource::get`].
    Remote,
    /// Compiled into the binary.
    Embedded(Asset),
}

/// A file placed at a fixed node path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileComponent {
    pub artifact: ArtifactName,
    pub origin: FileOrigin,
    pub path: &'static str,
    pub mode: u32,
    /// Removed on uninstall. Usually `path`, sometimes its directory.
    pub remove: &'static str,
}

pub const KUBECTL: FileComponent = FileComponent {
    artifact: ArtifactName::Kubectl,
    origin: FileOrigin::Remote,
    path: "/usr/local/bin/kubectl",
    mode: 0o755,
    remove: "/usr/local/bin/kubectl",
};

pub const IMAGE_CREDENTIAL_PROVIDER: FileComponent = FileComponent {
    artifact: ArtifactName::ImageCredentialProvider,
    origin: FileOrigin::Remote,
    path: "/etc/eks/image-credential-provider/ecr-credential-provider",
    mode: 0o755,
    remove: "/etc/eks/image-credential-provider",
};

pub const IAM_AUTHENTICATOR: FileComponent = FileComponent {
    artifact: ArtifactName::IamAuthenticator,
    origin: FileOrigin::Remote,
    path: "/usr/local/bin/aws-iam-authenticator",
    mode: 0o755,
    remove: "/usr/local/bin/aws-iam-authenticator",
};

pub const IAM_ROLES_ANYWHERE: FileComponent = FileComponent {
    artifact: ArtifactName::IamRolesAnywhere,
    origin: FileOrigin::Remote,
    path: "/usr/local/bin/aws_signing_helper",
    mode: 0o755,
    remove: "/usr/local/bin/aws_signing_helper",
};

impl FileComponent {
    async fn open(
        &self,
        env: &InstallEnv<
            '_,
            impl CommandRunner,
            impl ArtifactSource,
            impl NodeFilesystem,
            impl PackageProvider,
        >,
    ) -> Result<Source> {
        match self.origin {
            FileOrigin::Remote => env.sources.get(env.ctx, self.artifact).await,
            FileOrigin::Embedded(asset) => env.sources.asset(asset),
        }
        .with_context(|| format!("getting {} source", self.artifact))
    }

    /// Write `src` to the component path and check what was written. The
    /// copy stops at the next read once `ctx` is done.
    fn place(&self, ctx: &OpContext, fs: &impl NodeFilesystem, src: &mut Source) -> Result<()> {
        fs.install_file(self.path, &mut ctx.reader(&mut *src), self.mode)
            .with_context(|| format!("installing {}", self.artifact))?;
        if !src.verify_checksum() {
            return Err(anyhow::Error::new(src.checksum_error()))
                .with_context(|| format!("verifying {}", self.artifact));
        }
        tracing::debug!(artifact = %self.artifact, path = self.path, "file installed");
        Ok(())
    }

    /// Fetch and place the file without touching the tracker.
    ///
    /// Used by components made of several files that are tracked as one.
    pub async fn put(
        &self,
        env: &InstallEnv<
            '_,
            impl CommandRunner,
            impl ArtifactSource,
            impl NodeFilesystem,
            impl PackageProvider,
        >,
    ) -> Result<()> {
        let mut src = self.open(env).await?;
        self.place(env.ctx, env.fs, &mut src)
    }

    /// Install the file and record it in the tracker.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be fetched, the file cannot be written or
    /// the written bytes do not match the expected checksum. The tracker is
    /// left untouched on failure.
    pub async fn install(
        &self,
        env: &InstallEnv<
            '_,
            impl CommandRunner,
            impl ArtifactSource,
            impl NodeFilesystem,
            impl PackageProvider,
        >,
    ) -> Result<()> {
        self.put(env).await?;
        env.tracker.add(self.artifact)
    }

    /// Replace the installed file if the source differs from it.
    ///
    /// Returns whether the file was replaced.
    pub async fn upgrade(
        &self,
        env: &InstallEnv<
            '_,
            impl CommandRunner,
            impl ArtifactSource,
            impl NodeFilesystem,
            impl PackageProvider,
        >,
    ) -> Result<bool> {
        let mut src = self.open(env).await?;
        let available = env
            .fs
            .upgrade_available(self.path, &src)
            .with_context(|| format!("checking {} for upgrade", self.artifact))?;
        if !available {
            tracing::info!(artifact = %self.artifact, "No new version found. Skipping upgrade");
            return Ok(false);
        }
        self.place(env.ctx, env.fs, &mut src)?;
        tracing::info!(artifact = %self.artifact, "upgraded");
        Ok(true)
    }

    pub fn uninstall(
        &self,
        env: &InstallEnv<
            '_,
            impl CommandRunner,
            impl ArtifactSource,
            impl NodeFilesystem,
            impl PackageProvider,
        >,
    ) -> Result<()> {
        env.fs
            .remove_all(self.remove)
            .with_context(|| format!("removing {}", self.artifact))
    }
}
