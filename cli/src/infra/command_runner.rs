//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation. It uses tokio for
//! async process execution and kills the child when the operation context
//! finishes first.

use std::process::{Output, Stdio};

use tokio::io::AsyncReadExt;

use crate::application::context::OpContext;
use crate::application::ports::CommandRunner;
use crate::domain::{Cmd, CommandError};

/// Production `CommandRunner`.
///
/// Dropping the `wait` future alone does not stop the process, so the
/// interrupted branch kills the child explicitly before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, ctx: &OpContext, cmd: &Cmd) -> Result<Output, CommandError> {
        if let Some(reason) = ctx.err() {
            return Err(CommandError::Interrupted {
                cmd: cmd.to_string(),
                reason,
            });
        }

        tracing::debug!(cmd = %cmd, "running command");
        let mut child = tokio::process::Command::new(cmd.program())
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Launch {
                cmd: cmd.to_string(),
                source,
            })?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.map_err(|source| CommandError::Wait {
                        cmd: cmd.to_string(),
                        source,
                    })?,
                    stdout,
                    stderr,
                })
            } => result,
            reason = ctx.done() => {
                let _ = child.kill().await;
                Err(CommandError::Interrupted {
                    cmd: cmd.to_string(),
                    reason,
                })
            }
        }
    }
}
