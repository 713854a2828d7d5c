//! Install, upgrade and uninstall command-form artifacts with retries.
//!
//! The package is re-read on every attempt, so a package whose commands
//! change mid-loop is picked up by the next attempt.

use std::time::Duration;

use crate::application::context::OpContext;
use crate::application::ports::CommandRunner;
use crate::application::services::retry::retry;
use crate::domain::{Package, PackageOp, RetryInterrupted};

/// Run one package operation until it succeeds or `ctx` is done.
pub async fn run_package_with_retries<R, P>(
    ctx: &OpContext,
    runner: &R,
    pkg: &P,
    op: PackageOp,
    interval: Duration,
) -> Result<(), RetryInterrupted>
where
    R: CommandRunner,
    P: Package + ?Sized,
{
    retry(ctx, runner, || op.cmd(pkg), interval).await.map(|_| ())
}

pub async fn install_package_with_retries<R, P>(
    ctx: &OpContext,
    runner: &R,
    pkg: &P,
    interval: Duration,
) -> Result<(), RetryInterrupted>
where
    R: CommandRunner,
    P: Package + ?Sized,
{
    run_package_with_retries(ctx, runner, pkg, PackageOp::Install, interval).await
}

pub async fn upgrade_package_with_retries<R, P>(
    ctx: &OpContext,
    runner: &R,
    pkg: &P,
    interval: Duration,
) -> Result<(), RetryInterrupted>
where
    R: CommandRunner,
    P: Package + ?Sized,
{
    run_package_with_retries(ctx, runner, pkg, PackageOp::Upgrade, interval).await
}

pub async fn uninstall_package_with_retries<R, P>(
    ctx: &OpContext,
    runner: &R,
    pkg: &P,
    interval: Duration,
) -> Result<(), RetryInterrupted>
where
    R: CommandRunner,
    P: Package + ?Sized,
{
    run_package_with_retries(ctx, runner, pkg, PackageOp::Uninstall, interval).await
}
