//! # One-shot shutdown trigger.
//!
//! [`Trigger`] transitions the conductor from running to shutting down. It pairs
//! a [`OnceLock`] holding the first [`TriggerCause`] with a [`CancellationToken`]
//! that wakes every waiter.
//!
//! ## Rules
//! - **First arm wins**: later `arm` calls return `false` and change nothing.
//! - **Safe under races**: any number of tasks may arm concurrently; there is no
//!   channel to close twice and no send that can block.
//! - **Cause visible to waiters**: the cause is stored before the token is
//!   cancelled, so `cause()` is `Some` once `armed()` completes.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::core::signals::SignalKind;

/// Why the trigger fired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerCause {
    /// A process's `run` returned an error.
    ProcessFailed {
        /// Name of the failed process.
        process: Arc<str>,
        /// Rendered error.
        error: String,
    },
    /// The parent context passed to `start` was cancelled.
    Cancelled,
    /// An OS termination signal arrived.
    Signal(SignalKind),
    /// A process exited cleanly under [`ExitPolicy::StopOnCompletion`](crate::ExitPolicy::StopOnCompletion).
    Completed {
        /// Name of the process that finished.
        process: Arc<str>,
    },
    /// Shutdown was requested through [`Trigger::request`].
    Requested,
}

impl TriggerCause {
    /// Process responsible for the trigger, if any.
    pub fn process(&self) -> Option<&str> {
        match self {
            TriggerCause::ProcessFailed { process, .. } | TriggerCause::Completed { process } => {
                Some(process)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TriggerCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerCause::ProcessFailed { process, error } => {
                write!(f, "process {process} failed: {error}")
            }
            TriggerCause::Cancelled => f.write_str("context cancelled"),
            TriggerCause::Signal(kind) => write!(f, "received {kind}"),
            TriggerCause::Completed { process } => write!(f, "process {process} completed"),
            TriggerCause::Requested => f.write_str("shutdown requested"),
        }
    }
}

struct Inner {
    cause: OnceLock<TriggerCause>,
    token: CancellationToken,
}

/// Cloneable handle to the conductor's one-shot shutdown trigger.
#[derive(Clone)]
pub struct Trigger {
    inner: Arc<Inner>,
}

impl Trigger {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cause: OnceLock::new(),
                token: CancellationToken::new(),
            }),
        }
    }

    /// Arms the trigger with `cause`.
    ///
    /// Returns `true` if this call fired the trigger, `false` if it was already armed.
    pub fn arm(&self, cause: TriggerCause) -> bool {
        if self.inner.cause.set(cause).is_err() {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    /// Arms the trigger with [`TriggerCause::Requested`].
    pub fn request(&self) -> bool {
        self.arm(TriggerCause::Requested)
    }

    /// True once any cause has been recorded.
    pub fn is_armed(&self) -> bool {
        self.inner.cause.get().is_some()
    }

    /// The winning cause, if armed.
    pub fn cause(&self) -> Option<&TriggerCause> {
        self.inner.cause.get()
    }

    /// Completes once the trigger is armed.
    pub async fn armed(&self) {
        self.inner.token.cancelled().await;
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("cause", &self.inner.cause.get())
            .finish()
    }
}
