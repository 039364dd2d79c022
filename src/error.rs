//! Error types used by the conductor and by processes.
//!
//! This module defines two main error enums:
//!
//! - [`ConductorError`]: errors raised while building the conductor itself.
//! - [`ProcessError`]: errors reported by individual processes from `run` or `stop`.
//!
//! Both types provide `as_label` for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while constructing a conductor.
///
/// The conductor has no runtime error path: once built, every failure it
/// observes is either a process failure (reported through the failure stream)
/// or a stop failure (reported through events).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConductorError {
    /// The conductor was built outside of a Tokio runtime.
    #[error("conductor must be built inside a tokio runtime")]
    NoRuntime,

    /// OS signal interest could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl ConductorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conductor::ConductorError;
    ///
    /// assert_eq!(ConductorError::NoRuntime.as_label(), "conductor_no_runtime");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConductorError::NoRuntime => "conductor_no_runtime",
            ConductorError::Signal(_) => "conductor_signal_registration",
        }
    }
}

/// # Errors reported by a process.
///
/// Returned from [`Process::run`](crate::Process::run) to request a system-wide
/// shutdown, or from [`Process::stop`](crate::Process::stop) to report incomplete
/// cleanup. [`ProcessError::Canceled`] returned from `run` is a clean exit.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The process failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The process hit a condition it cannot recover from.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The operation did not finish within its deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The time budget that was exceeded.
        timeout: Duration,
    },

    /// The process panicked; the panic was caught at the conductor boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The process observed cancellation and exited.
    #[error("context cancelled")]
    Canceled,
}

impl ProcessError {
    /// Shorthand for [`ProcessError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ProcessError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`ProcessError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        ProcessError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conductor::ProcessError;
    ///
    /// assert_eq!(ProcessError::fail("boom").as_label(), "process_failed");
    /// assert_eq!(ProcessError::Canceled.as_label(), "process_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Fail { .. } => "process_failed",
            ProcessError::Fatal { .. } => "process_fatal",
            ProcessError::Timeout { .. } => "process_timeout",
            ProcessError::Panicked { .. } => "process_panicked",
            ProcessError::Canceled => "process_canceled",
        }
    }

    /// True for [`ProcessError::Canceled`], which `run` may return on a clean,
    /// cancellation-driven exit.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProcessError::Canceled)
    }

    /// Builds a [`ProcessError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        ProcessError::Panicked { info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let err = ProcessError::from_panic(Box::new("static message"));
        assert_eq!(
            err,
            ProcessError::Panicked {
                info: "static message".into()
            }
        );

        let err = ProcessError::from_panic(Box::new(String::from("owned message")));
        assert_eq!(err.to_string(), "panicked: owned message");

        let err = ProcessError::from_panic(Box::new(42u8));
        assert_eq!(err.to_string(), "panicked: unknown panic");
    }

    #[test]
    fn only_canceled_is_cancellation() {
        assert!(ProcessError::Canceled.is_cancellation());
        assert!(!ProcessError::fail("x").is_cancellation());
        assert!(!ProcessError::Timeout {
            timeout: Duration::from_secs(1)
        }
        .is_cancellation());
    }
}
