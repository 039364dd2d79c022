//! # Monitor: arms the trigger on the first failure or parent cancellation.
//!
//! ```text
//! select! {
//!   failure record in buffer ─► publish FailureObserved ─► arm(ProcessFailed)
//!   parent cancelled         ─► publish ContextCancelled ─► arm(Cancelled)
//!   trigger already armed    ─► exit (signal, request, or exit policy won)
//! }
//! ```
//!
//! The monitor arms at most once and never loops. When it exits it hands the
//! buffer receiver back together with the record it consumed, so the caller's
//! failure stream still contains every record.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::trigger::{Trigger, TriggerCause},
    events::{Bus, Event, EventKind},
    process::{FailureStream, ProcessFailure},
};

/// Waits for the first terminating condition and arms `trigger`.
pub(crate) async fn monitor(
    mut failures: mpsc::Receiver<ProcessFailure>,
    parent: CancellationToken,
    trigger: Trigger,
    bus: Bus,
) -> FailureStream {
    let first = tokio::select! {
        Some(failure) = failures.recv() => {
            bus.publish(
                Event::new(EventKind::FailureObserved)
                    .with_process(failure.name())
                    .with_reason(failure.error.to_string()),
            );
            trigger.arm(TriggerCause::ProcessFailed {
                process: failure.name().into(),
                error: failure.error.to_string(),
            });
            Some(failure)
        }
        _ = parent.cancelled() => {
            bus.publish(Event::new(EventKind::ContextCancelled));
            trigger.arm(TriggerCause::Cancelled);
            None
        }
        _ = trigger.armed() => None,
    };
    FailureStream::new(first, failures)
}
