//! Retry engine for OS-level commands.

use std::process::Output;
use std::time::Duration;

use crate::application::context::OpContext;
use crate::application::ports::{CommandRunner, check_status};
use crate::domain::{Cmd, RetryInterrupted};

/// Default wait between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Run the command produced by `factory` until it exits successfully or
/// `ctx` is done.
///
/// `factory` is called once per attempt, so each attempt gets a fresh
/// command. Launch failures and non-zero exits are both retried after
/// `interval`. There is no attempt limit; bound the loop with a deadline on
/// `ctx`. If `ctx` is already done, nothing is launched.
///
/// # Errors
///
/// Returns [`RetryInterrupted`] once `ctx` is cancelled or its deadline
/// passes. Its message includes the last command failure.
pub async fn retry<R, F>(
    ctx: &OpContext,
    runner: &R,
    mut factory: F,
    interval: Duration,
) -> Result<Output, RetryInterrupted>
where
    R: CommandRunner + ?Sized,
    F: FnMut() -> Cmd,
{
    let mut attempts = 0u32;
    let mut last_error = None;
    loop {
        if let Some(reason) = ctx.err() {
            return Err(RetryInterrupted {
                reason,
                attempts,
                last_error,
            });
        }

        let cmd = factory();
        attempts += 1;
        match runner
            .run(ctx, &cmd)
            .await
            .and_then(|out| check_status(&cmd, out))
        {
            Ok(out) => return Ok(out),
            Err(e) => {
                tracing::debug!(attempt = attempts, error = %e, "command failed, retrying");
                last_error = Some(e);
            }
        }

        if let Err(reason) = ctx.sleep(interval).await {
            return Err(RetryInterrupted {
                reason,
                attempts,
                last_error,
            });
        }
    }
}
