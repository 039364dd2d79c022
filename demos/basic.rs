//! # Example: basic
//!
//! One process that fails after two seconds, which shuts the conductor down.
//!
//! ## Flow
//! ```text
//! Conductor::new([worker]) ──► start(&parent)
//!     ├─► runner: ProcessStarting ─► run() ─► Err after 2s ─► ProcessFailed
//!     ├─► monitor: FailureObserved ─► arm(ProcessFailed)
//!     └─► then_stop()
//!          ├─► ShutdownRequested, cancel run context
//!          ├─► stop(ctx) ─► ProcessStopped
//!          └─► AllStoppedWithin ─► ShutdownReport
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=conductor=debug cargo run --example basic
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conductor::{Conductor, Process, ProcessError, ProcessRef, StopContext};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Simulates a unit of work that breaks after a fixed duration.
struct Worker {
    done: CancellationToken,
}

#[async_trait]
impl Process for Worker {
    fn name(&self) -> &str {
        "worker"
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        tokio::select! {
            _ = ctx.cancelled() => Err(ProcessError::Canceled),
            _ = self.done.cancelled() => Ok(()),
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                println!("[worker] work duration elapsed");
                Err(ProcessError::fail("simulated error after work duration"))
            }
        }
    }

    async fn stop(&self, _ctx: StopContext) -> Result<(), ProcessError> {
        self.done.cancel();
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conductor=info")),
        )
        .init();

    let worker: ProcessRef = Arc::new(Worker {
        done: CancellationToken::new(),
    });

    let mut report = Conductor::new(vec![worker])?
        .start(&CancellationToken::new())
        .then_stop()
        .await;

    println!("[main] shutdown cause: {}", report.cause());
    println!("[main] stopped cleanly: {}", report.all_stopped());
    for failure in report.errors().drain() {
        println!("[main] {failure}");
    }
    Ok(())
}
