//! # Deadline-bounded stop fan-out.
//!
//! ```text
//! ctx = StopContext::with_grace(grace)       (fresh clock, not the run context)
//!
//! JoinSet:
//!   process[0] ─► ProcessStopping ─► stop(ctx) ─► ProcessStopped | ProcessStopFailed
//!   process[1] ─► ...
//!   process[N] ─► ...
//!
//! timeout_at(ctx.deadline, join all):
//!   ├─ all joined  → AllStoppedWithin
//!   └─ deadline    → detach the rest, ProcessAbandoned per straggler, GraceExceeded
//! ```
//!
//! Stop errors are recorded and published, never retried or escalated. The
//! fan-out never waits past the deadline; detached stop calls keep running but
//! their outcome is dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};

use crate::{
    core::report::{StopOutcome, StopReport},
    error::ProcessError,
    events::{Bus, Event, EventKind},
    process::{ProcessRef, StopContext},
};

/// Calls `stop` on every process concurrently and collects outcomes until the deadline.
///
/// Returns outcomes in the order of `processes` and the time spent.
pub(crate) async fn stop_all(
    processes: &[ProcessRef],
    grace: Duration,
    bus: &Bus,
) -> (Vec<StopReport>, Duration) {
    let started = Instant::now();
    let ctx = StopContext::with_grace(grace);

    let mut outcomes: Vec<StopReport> = processes
        .iter()
        .map(|p| StopReport {
            process: Arc::from(p.name()),
            outcome: StopOutcome::Abandoned,
        })
        .collect();

    let mut set = JoinSet::new();
    for (idx, process) in processes.iter().enumerate() {
        let process = Arc::clone(process);
        let bus = bus.clone();
        set.spawn(async move { (idx, stop_one(process, ctx, &bus).await) });
    }

    let collect = async {
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx].outcome = outcome,
                Err(e) => tracing::debug!(error = %e, "stop task did not complete"),
            }
        }
    };

    let timed = time::timeout_at(ctx.deadline(), collect).await;
    match timed {
        Ok(()) => {
            bus.publish(Event::new(EventKind::AllStoppedWithin).with_grace(grace));
        }
        Err(_elapsed) => {
            set.detach_all();
            let abandoned: Vec<&str> = outcomes
                .iter()
                .filter(|r| r.outcome == StopOutcome::Abandoned)
                .map(|r| &*r.process)
                .collect();
            for name in &abandoned {
                bus.publish(
                    Event::new(EventKind::ProcessAbandoned)
                        .with_process(*name)
                        .with_grace(grace),
                );
            }
            bus.publish(
                Event::new(EventKind::GraceExceeded)
                    .with_grace(grace)
                    .with_reason(abandoned.join(",")),
            );
        }
    }

    (outcomes, started.elapsed())
}

/// Stops one process, publishing its stop events.
async fn stop_one(process: ProcessRef, ctx: StopContext, bus: &Bus) -> StopOutcome {
    let name = process.name();
    bus.publish(Event::new(EventKind::ProcessStopping).with_process(name));

    let res = std::panic::AssertUnwindSafe(process.stop(ctx))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ProcessError::from_panic(panic)));

    match res {
        Ok(()) => {
            bus.publish(Event::new(EventKind::ProcessStopped).with_process(name));
            StopOutcome::Stopped
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProcessStopFailed)
                    .with_process(name)
                    .with_reason(e.to_string()),
            );
            StopOutcome::Failed(e)
        }
    }
}
