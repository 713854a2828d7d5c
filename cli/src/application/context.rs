//! Cancellation and deadline scope for a tree of operations.
//!
//! An `OpContext` carries any number of cancel signals and at most one
//! deadline. Derived contexts inherit every parent signal and the earlier of
//! the two deadlines, so cancelling a parent stops all of its children.

use std::io::{self, Read};
use std::time::Duration;

use futures_util::future::select_all;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::ContextError;

#[derive(Debug, Clone, Default)]
pub struct OpContext {
    signals: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Cancels the context it was created with, and every context derived from it.
///
/// Dropping the handle without calling [`CancelHandle::cancel`] leaves the
/// context running.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl OpContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can additionally be cancelled through the
    /// returned handle.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut child = self.clone();
        child.signals.push(rx);
        (child, CancelHandle { tx })
    }

    /// Derive a context that expires `timeout` from now, or earlier if the
    /// parent expires first.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_deadline(&self, at: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        child
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.signals.iter().any(|rx| *rx.borrow()) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        if let Some(err) = self.err() {
            return err;
        }

        let cancelled = async {
            if self.signals.is_empty() {
                return std::future::pending::<()>().await;
            }
            let waits = self.signals.iter().cloned().map(|mut rx| {
                Box::pin(async move {
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    if !fired {
                        // Sender dropped without cancelling.
                        std::future::pending::<()>().await;
                    }
                })
            });
            select_all(waits).await;
        };

        let expired = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = cancelled => ContextError::Cancelled,
            () = expired => ContextError::DeadlineExceeded,
        }
    }

    /// Wrap a blocking reader so it fails at the next `read` once this
    /// context is done.
    #[must_use]
    pub fn reader<R: Read>(&self, inner: R) -> ContextReader<'_, R> {
        ContextReader { ctx: self, inner }
    }

    /// Sleep for `duration` unless the context finishes first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ContextError> {
        tokio::select! {
            () = tokio::time::sleep(duration) => self.err().map_or(Ok(()), Err),
            err = self.done() => Err(err),
        }
    }
}

/// Blocking reader bound to an [`OpContext`].
///
/// Fails with `ErrorKind::TimedOut` after a deadline and `ErrorKind::Other`
/// after cancellation, never `Interrupted`, which `io::copy` retries.
#[derive(Debug)]
pub struct ContextReader<'a, R> {
    ctx: &'a OpContext,
    inner: R,
}

impl<R: Read> Read for ContextReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.ctx.err() {
            Some(reason @ ContextError::DeadlineExceeded) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, reason))
            }
            Some(reason) => Err(io::Error::other(reason)),
            None => self.inner.read(buf),
        }
    }
}
