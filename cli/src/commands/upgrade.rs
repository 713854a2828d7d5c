//! Upgrade command: move installed components to another Kubernetes
//! version.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::components::InstallEnv;
use crate::application::services::upgrade::upgrade;
use crate::commands::install::DEFAULT_REGION;
use crate::commands::{kubernetes_version, parse_duration};

/// Arguments for the `nodeadm upgrade` command.
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Kubernetes version to upgrade to, e.g. 1.31
    pub kubernetes_version: String,

    /// Give up after this long (e.g. 20m, 90s)
    #[arg(short = 't', long, default_value = "20m", value_parser = parse_duration)]
    pub timeout: Duration,
}

/// Run the upgrade command.
///
/// # Errors
///
/// Returns an error for an invalid version, a non-root user, an empty
/// tracker, or the first component that fails to upgrade.
pub async fn run(app: &AppContext, args: &UpgradeArgs) -> Result<()> {
    let version = kubernetes_version(&args.kubernetes_version)?;
    app.ensure_root()?;

    let packages = app.packages()?;
    let sources = app.sources(version.clone(), DEFAULT_REGION, &packages)?;
    let tracker = app.tracker()?;
    let ctx = app.ctx.with_timeout(args.timeout);

    tracing::info!(kubernetes_version = %version, "upgrading node components");
    let env = InstallEnv {
        ctx: &ctx,
        runner: &app.runner,
        sources: &sources,
        fs: &app.fs,
        packages: &packages,
        tracker: &tracker,
        retry_interval: app.settings.retry_interval(),
    };
    upgrade(&env).await
}
