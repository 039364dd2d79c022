//! # Exit policy for processes that finish on their own.
//!
//! [`ExitPolicy`] decides what a clean exit of [`Process::run`](crate::Process::run)
//! means for the rest of the set. Errors always trigger shutdown and
//! cancellation never does; this policy only covers `Ok(())` returned while the
//! run context is still live.
//!
//! ```text
//! run() → Ok(()) ──┬─ ExitPolicy::Ignore           → log "completed", siblings keep running
//!                  └─ ExitPolicy::StopOnCompletion → arm trigger (TriggerCause::Completed)
//! ```

/// Policy controlling whether a clean process exit stops its siblings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// A clean exit is logged and nothing else happens (default).
    #[default]
    Ignore,
    /// The first clean exit arms the shutdown trigger.
    StopOnCompletion,
}

impl ExitPolicy {
    /// Returns true if a clean exit should arm the trigger.
    #[inline]
    pub fn stops_on_completion(self) -> bool {
        matches!(self, ExitPolicy::StopOnCompletion)
    }
}
