//! # LogWriter: events to `tracing`
//!
//! A subscriber that forwards every [`Event`] to the `tracing` facade with
//! structured fields keyed by `process`. Installed by default by
//! [`Conductor::new`](crate::Conductor::new).
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO conductor: starting process process="http"
//! ERROR conductor: process failed process="http" error="execution failed: bind"
//! WARN conductor: shutdown requested cause="process http failed: ..." grace_ms=5000
//! INFO conductor: stopping process process="http"
//! INFO conductor: stopped process process="http"
//! WARN conductor: abandoned process after grace period process="db" grace_ms=5000
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let process = e.process.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ProcessStarting => {
                info!(target: "conductor", process, "starting process");
            }
            EventKind::ProcessCompleted => {
                info!(target: "conductor", process, reason, "process completed");
            }
            EventKind::ProcessFailed => {
                error!(target: "conductor", process, error = reason, "process failed");
            }
            EventKind::FailureObserved => {
                error!(target: "conductor", process, error = reason, "process error");
            }
            EventKind::ContextCancelled => {
                warn!(target: "conductor", "context cancelled");
            }
            EventKind::SignalIgnored => {
                debug!(target: "conductor", signal = reason, "signal ignored, shutdown already in progress");
            }
            EventKind::ShutdownRequested => {
                warn!(target: "conductor", cause = reason, grace_ms = e.grace_ms, "shutdown requested, stopping all processes");
            }
            EventKind::ProcessStopping => {
                info!(target: "conductor", process, "stopping process");
            }
            EventKind::ProcessStopped => {
                info!(target: "conductor", process, "stopped process");
            }
            EventKind::ProcessStopFailed => {
                error!(target: "conductor", process, error = reason, "failed to stop process");
            }
            EventKind::ProcessAbandoned => {
                warn!(target: "conductor", process, grace_ms = e.grace_ms, "abandoned process after grace period");
            }
            EventKind::AllStoppedWithin => {
                info!(target: "conductor", grace_ms = e.grace_ms, "all processes stopped within grace period");
            }
            EventKind::GraceExceeded => {
                warn!(target: "conductor", grace_ms = e.grace_ms, abandoned = reason, "grace period exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "conductor", subscriber = process, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "conductor", subscriber = process, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
