//! # Run one process to completion.
//!
//! Executes [`Process::run`] once, publishes lifecycle events to [`Bus`] and
//! queues a failure record when `run` fails.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   run() → Ok(())          → publish ProcessCompleted
//!
//! Cancellation:
//!   run() → Err(Canceled)   → publish ProcessCompleted (reason "cancelled")
//!
//! Failure:
//!   run() → Err(other)      → publish ProcessFailed
//!                           → try_send ProcessFailure (never waits)
//!
//! Panic:
//!   run() panics            → treated as Err(Panicked)
//! ```
//!
//! ## Rules
//! - Publishes `ProcessStarting` and **exactly one** terminal event
//! - A clean exit never arms the trigger unless the exit policy says so
//!   and the run context was still live

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::trigger::{Trigger, TriggerCause},
    error::ProcessError,
    events::{Bus, Event, EventKind},
    policies::ExitPolicy,
    process::{ProcessFailure, ProcessRef},
};

/// Everything a runner task needs besides the process itself.
#[derive(Clone)]
pub(crate) struct RunnerParams {
    pub bus: Bus,
    pub failures: mpsc::Sender<ProcessFailure>,
    pub trigger: Trigger,
    pub exit_policy: ExitPolicy,
}

/// Runs `process` once under `ctx` and reports the outcome.
pub(crate) async fn run_process(process: ProcessRef, ctx: CancellationToken, params: RunnerParams) {
    let name = process.name();
    params
        .bus
        .publish(Event::new(EventKind::ProcessStarting).with_process(name));

    let res = std::panic::AssertUnwindSafe(process.run(ctx.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ProcessError::from_panic(panic)));

    match res {
        Ok(()) => {
            params
                .bus
                .publish(Event::new(EventKind::ProcessCompleted).with_process(name));
            if params.exit_policy.stops_on_completion() && !ctx.is_cancelled() {
                params.trigger.arm(TriggerCause::Completed {
                    process: name.into(),
                });
            }
        }
        Err(ProcessError::Canceled) => {
            params.bus.publish(
                Event::new(EventKind::ProcessCompleted)
                    .with_process(name)
                    .with_reason("cancelled"),
            );
        }
        Err(error) => {
            params.bus.publish(
                Event::new(EventKind::ProcessFailed)
                    .with_process(name)
                    .with_reason(error.to_string()),
            );
            report_failure(&params.failures, ProcessFailure {
                process: process.clone(),
                error,
            });
        }
    }
}

/// Queues a failure record without waiting.
///
/// The buffer holds one slot per process, so `Full` means a runner sent twice.
/// `Closed` means the caller dropped the shutdown report and nobody can read it.
fn report_failure(failures: &mpsc::Sender<ProcessFailure>, failure: ProcessFailure) {
    match failures.try_send(failure) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(f)) => {
            tracing::warn!(process = f.name(), error = %f.error, "failure buffer full, record dropped");
        }
        Err(mpsc::error::TrySendError::Closed(f)) => {
            tracing::debug!(process = f.name(), error = %f.error, "failure stream closed, record dropped");
        }
    }
}
