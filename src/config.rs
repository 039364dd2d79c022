//! # Conductor configuration.
//!
//! Provides [`ConductorConfig`], centralized settings for a conductor.
//!
//! ## Sentinel values
//! - `grace = 0s` → stops are launched and immediately abandoned
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::ExitPolicy;

/// Default shutdown grace period.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Configuration for a [`Conductor`](crate::Conductor).
///
/// ## Field semantics
/// - `grace`: shared deadline for all `stop` calls once shutdown begins
/// - `handle_signals`: register SIGINT/SIGTERM (Ctrl-C on non-Unix) at construction
/// - `exit_policy`: whether a clean `run` exit stops the other processes
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Maximum time shutdown waits for `stop` calls.
    ///
    /// The deadline is derived from a fresh clock reading when shutdown starts,
    /// never from the run context, so a cancellation-triggered shutdown still
    /// gets the full period.
    pub grace: Duration,

    /// Register interest in OS termination signals.
    ///
    /// Registration happens at construction and is released after shutdown.
    pub handle_signals: bool,

    /// What a clean process exit means for its siblings.
    pub exit_policy: ExitPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// the oldest ones.
    pub bus_capacity: usize,
}

impl ConductorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ConductorConfig {
    /// Default configuration:
    ///
    /// - `grace = 5s`
    /// - `handle_signals = true`
    /// - `exit_policy = ExitPolicy::Ignore`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
            handle_signals: true,
            exit_policy: ExitPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
