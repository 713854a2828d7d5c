//! Install command: put every node component on the host.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use nodeadm_common::{ContainerdSource, CredentialProvider};

use crate::app::AppContext;
use crate::application::services::components::InstallEnv;
use crate::application::services::install::{InstallOptions, install};
use crate::commands::{kubernetes_version, parse_duration};

pub const DEFAULT_REGION: &str = "us-west-2";

/// Arguments for the `nodeadm install` command.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Kubernetes version to install, e.g. 1.31
    pub kubernetes_version: String,

    /// Credential provider the node will use
    #[arg(short = 'p', long, value_enum)]
    pub credential_provider: CredentialProvider,

    /// Where containerd is installed from
    #[arg(short = 's', long, value_enum, default_value = "distro")]
    pub containerd_source: ContainerdSource,

    /// Region the SSM agent is installed for
    #[arg(short = 'r', long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Give up after this long (e.g. 20m, 90s)
    #[arg(short = 't', long, default_value = "20m", value_parser = parse_duration)]
    pub timeout: Duration,
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error for an invalid version, a non-root user, an unsupported
/// host, or the first component that fails to install.
pub async fn run(app: &AppContext, args: &InstallArgs) -> Result<()> {
    let version = kubernetes_version(&args.kubernetes_version)?;
    app.ensure_root()?;

    let packages = app.packages()?;
    let sources = app.sources(version.clone(), &args.region, &packages)?;
    let tracker = app.tracker()?;
    let ctx = app.ctx.with_timeout(args.timeout);

    tracing::info!(
        kubernetes_version = %version,
        credential_provider = %args.credential_provider,
        "installing node components"
    );
    let env = InstallEnv {
        ctx: &ctx,
        runner: &app.runner,
        sources: &sources,
        fs: &app.fs,
        packages: &packages,
        tracker: &tracker,
        retry_interval: app.settings.retry_interval(),
    };
    let opts = InstallOptions {
        credential_provider: args.credential_provider,
        containerd_source: args.containerd_source,
        region: args.region.clone(),
    };
    install(&env, &opts).await
}
