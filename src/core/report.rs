//! # Result of the single shutdown pass.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::trigger::TriggerCause,
    error::ProcessError,
    process::FailureStream,
};

/// How one process's `stop` ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// `stop` returned `Ok` before the deadline.
    Stopped,
    /// `stop` returned an error (or panicked) before the deadline.
    Failed(ProcessError),
    /// `stop` had not returned at the deadline; its outcome was discarded.
    Abandoned,
}

impl StopOutcome {
    /// True for [`StopOutcome::Stopped`].
    pub fn is_stopped(&self) -> bool {
        matches!(self, StopOutcome::Stopped)
    }
}

/// Per-process stop result, in the conductor's insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopReport {
    /// Process name.
    pub process: Arc<str>,
    /// What `stop` did.
    pub outcome: StopOutcome,
}

/// What happened during shutdown, plus the failure records collected while running.
#[derive(Debug)]
pub struct ShutdownReport {
    pub(crate) cause: TriggerCause,
    pub(crate) outcomes: Vec<StopReport>,
    pub(crate) grace: Duration,
    pub(crate) elapsed: Duration,
    pub(crate) failures: FailureStream,
}

impl ShutdownReport {
    /// Why shutdown started.
    pub fn cause(&self) -> &TriggerCause {
        &self.cause
    }

    /// Stop outcome of every process, in insertion order.
    pub fn outcomes(&self) -> &[StopReport] {
        &self.outcomes
    }

    /// Outcome for the first process named `name`.
    pub fn outcome_of(&self, name: &str) -> Option<&StopOutcome> {
        self.outcomes
            .iter()
            .find(|r| &*r.process == name)
            .map(|r| &r.outcome)
    }

    /// Names of processes whose `stop` was still pending at the deadline.
    pub fn abandoned(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|r| r.outcome == StopOutcome::Abandoned)
            .map(|r| &*r.process)
            .collect()
    }

    /// True if any `stop` was abandoned.
    pub fn grace_exceeded(&self) -> bool {
        self.outcomes
            .iter()
            .any(|r| r.outcome == StopOutcome::Abandoned)
    }

    /// True if every `stop` returned `Ok`.
    pub fn all_stopped(&self) -> bool {
        self.outcomes.iter().all(|r| r.outcome.is_stopped())
    }

    /// The configured grace period.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Time spent in the stop fan-out.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Failure records reported by `run`.
    pub fn errors(&mut self) -> &mut FailureStream {
        &mut self.failures
    }

    /// Consumes the report, returning the failure stream.
    pub fn into_errors(self) -> FailureStream {
        self.failures
    }
}
