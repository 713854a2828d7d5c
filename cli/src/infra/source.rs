//! Download sources for file artifacts.
//!
//! Release binaries come from the EKS hybrid artifact bucket with a
//! `.sha256` sidecar next to each file. The SSM setup CLI comes from a
//! regional bucket without one.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::context::OpContext;
use crate::application::ports::ArtifactSource;
use crate::domain::{ArtifactName, Asset, Checksum, Source};
use crate::infra::assets::asset_source;

pub const DEFAULT_RELEASE_BASE_URL: &str = "https://hybrid-assets.eks.amazonaws.com/releases";

const USER_AGENT: &str = concat!("nodeadm/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest a download may go without receiving a byte.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Architecture name used in download URLs for the running binary.
///
/// # Errors
///
/// Returns an error on architectures nodeadm has no artifacts for.
pub fn host_arch() -> Result<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Ok("amd64"),
        "aarch64" => Ok("arm64"),
        other => anyhow::bail!("unsupported architecture: {other}"),
    }
}

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .user_agent(USER_AGENT)
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .build()
}

fn http_get(agent: &ureq::Agent, url: &str) -> Result<ureq::Response> {
    match agent.get(url).call() {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("GET {url}: HTTP {code}"),
        Err(e) => Err(anyhow::Error::new(e)).with_context(|| format!("GET {url}")),
    }
}

/// Open `url` as a streaming source, reading the expected checksum from
/// `<url>.sha256` when `sidecar` is set.
///
/// The request runs on the blocking pool and is abandoned if `ctx`
/// finishes first. The body is read later by the caller, bounded by
/// [`READ_TIMEOUT`] per read and by the caller's context.
async fn fetch(
    ctx: &OpContext,
    artifact: ArtifactName,
    url: String,
    sidecar: bool,
) -> Result<Source> {
    let task_url = url.clone();
    let task = tokio::task::spawn_blocking(move || {
        let agent = agent();
        let expected = if sidecar {
            let sum_url = format!("{task_url}.sha256");
            let body = http_get(&agent, &sum_url)?
                .into_string()
                .with_context(|| format!("reading {sum_url}"))?;
            let sum = Checksum::from_sidecar(&body)
                .ok_or_else(|| anyhow::anyhow!("invalid checksum file {sum_url}"))?;
            Some(sum)
        } else {
            None
        };
        let resp = http_get(&agent, &task_url)?;
        tracing::debug!(artifact = %artifact, url = %task_url, "downloading");
        Ok::<_, anyhow::Error>(Source::new(artifact, resp.into_reader(), expected))
    });

    tokio::select! {
        result = task => result.context("download task panicked")?,
        reason = ctx.done() => Err(anyhow::Error::new(reason))
            .with_context(|| format!("downloading {url}")),
    }
}

/// File name of an artifact in the release layout, if it has one.
#[must_use]
pub fn release_file_name(name: ArtifactName) -> Option<&'static str> {
    match name {
        ArtifactName::Kubelet => Some("kubelet"),
        ArtifactName::Kubectl => Some("kubectl"),
        ArtifactName::ImageCredentialProvider => Some("ecr-credential-provider"),
        ArtifactName::IamAuthenticator => Some("aws-iam-authenticator"),
        ArtifactName::IamRolesAnywhere => Some("aws_signing_helper"),
        _ => None,
    }
}

/// Binaries published for one Kubernetes version.
#[derive(Debug, Clone)]
pub struct ReleaseSource {
    base_url: String,
    kubernetes_version: semver::Version,
    arch: &'static str,
}

impl ReleaseSource {
    #[must_use]
    pub fn new(base_url: &str, kubernetes_version: semver::Version, arch: &'static str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            kubernetes_version,
            arch,
        }
    }

    /// `{base}/{version}/bin/linux/{arch}/{file}`
    #[must_use]
    pub fn url(&self, name: ArtifactName) -> Option<String> {
        release_file_name(name).map(|file| {
            format!(
                "{}/{}/bin/linux/{}/{file}",
                self.base_url, self.kubernetes_version, self.arch
            )
        })
    }

    /// # Errors
    ///
    /// Fails for artifacts outside the release layout, on HTTP errors, and
    /// when `ctx` finishes before the download starts.
    pub async fn get(&self, ctx: &OpContext, name: ArtifactName) -> Result<Source> {
        let url = self
            .url(name)
            .ok_or_else(|| anyhow::anyhow!("{name} is not part of the release"))?;
        fetch(ctx, name, url, true).await
    }
}

/// Amazon's SSM setup CLI for one region.
#[derive(Debug, Clone)]
pub struct SsmInstallerSource {
    region: String,
    variant: &'static str,
    arch: &'static str,
}

impl SsmInstallerSource {
    /// `variant` is `debian` on apt hosts and `linux` otherwise.
    #[must_use]
    pub fn new(region: &str, variant: &'static str, arch: &'static str) -> Self {
        Self {
            region: region.to_string(),
            variant,
            arch,
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "https://amazon-ssm-{r}.s3.{r}.amazonaws.com/latest/{}_{}/ssm-setup-cli",
            self.variant,
            self.arch,
            r = self.region
        )
    }

    /// # Errors
    ///
    /// Fails on HTTP errors or when `ctx` finishes first.
    pub async fn get(&self, ctx: &OpContext) -> Result<Source> {
        fetch(ctx, ArtifactName::Ssm, self.url(), false).await
    }
}

/// Production `ArtifactSource`: routes each artifact to where it is
/// published.
#[derive(Debug, Clone)]
pub struct NodeSources {
    pub release: ReleaseSource,
    pub ssm: SsmInstallerSource,
    /// Docker's signing key or repo definition for the host package manager.
    pub docker_repo_url: String,
}

impl ArtifactSource for NodeSources {
    async fn get(&self, ctx: &OpContext, name: ArtifactName) -> Result<Source> {
        match name {
            ArtifactName::Ssm => self.ssm.get(ctx).await,
            ArtifactName::DockerRepo => {
                fetch(ctx, name, self.docker_repo_url.clone(), false).await
            }
            ArtifactName::Containerd | ArtifactName::Iptables => {
                anyhow::bail!("{name} is installed through the package manager")
            }
            _ => self.release.get(ctx, name).await,
        }
    }

    fn asset(&self, asset: Asset) -> Result<Source> {
        asset_source(asset)
    }
}

/// `ArtifactSource` for operations that never download, such as
/// uninstall. Embedded assets are still served.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDownloads;

impl ArtifactSource for NoDownloads {
    async fn get(&self, _ctx: &OpContext, name: ArtifactName) -> Result<Source> {
        anyhow::bail!("{name} cannot be downloaded during this operation")
    }

    fn asset(&self, asset: Asset) -> Result<Source> {
        asset_source(asset)
    }
}
