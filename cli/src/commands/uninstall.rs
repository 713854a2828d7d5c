//! Uninstall command: remove what nodeadm installed.

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::components::InstallEnv;
use crate::application::services::uninstall::{UninstallOptions, uninstall};
use crate::infra::source::NoDownloads;

/// Steps `nodeadm uninstall` can leave out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UninstallSkip {
    /// Keep containerd and its package repository
    ContainerdRemoval,
}

/// Arguments for the `nodeadm uninstall` command.
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Steps to skip
    #[arg(long, value_enum, value_delimiter = ',')]
    pub skip: Vec<UninstallSkip>,
}

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error for a non-root user or the first component that fails
/// to uninstall.
pub async fn run(app: &AppContext, args: &UninstallArgs) -> Result<()> {
    app.ensure_root()?;
    let packages = app.packages()?;
    let tracker = app.tracker()?;

    let env = InstallEnv {
        ctx: &app.ctx,
        runner: &app.runner,
        sources: &NoDownloads,
        fs: &app.fs,
        packages: &packages,
        tracker: &tracker,
        retry_interval: app.settings.retry_interval(),
    };
    let opts = UninstallOptions {
        skip_containerd: args.skip.contains(&UninstallSkip::ContainerdRemoval),
    };
    uninstall(&env, opts).await
}
