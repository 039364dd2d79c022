//! # Example: signals
//!
//! Long-running processes that only stop on Ctrl-C (SIGINT) or SIGTERM.
//! The `drain` process takes a while to flush on stop; `stuck` never returns
//! from `stop` and is abandoned once the grace period runs out.
//!
//! ## Run
//! ```bash
//! cargo run --example signals
//! # press Ctrl-C
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use conductor::{
    Conductor, ConductorConfig, LogWriter, Process, ProcessError, ProcessRef, StopContext,
    StopOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct Ticker {
    name: &'static str,
    every: Duration,
    flush: Duration,
}

#[async_trait]
impl Process for Ticker {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        let mut ticks = tokio::time::interval(self.every);
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Err(ProcessError::Canceled),
                _ = ticks.tick() => println!("[{}] tick", self.name),
            }
        }
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ProcessError> {
        println!("[{}] flushing, {:?} left", self.name, ctx.remaining());
        ctx.bound(tokio::time::sleep(self.flush)).await
    }
}

/// Never finishes its stop.
struct Stuck;

#[async_trait]
impl Process for Stuck {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        ctx.cancelled().await;
        Err(ProcessError::Canceled)
    }

    async fn stop(&self, _ctx: StopContext) -> Result<(), ProcessError> {
        std::future::pending().await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conductor=debug")),
        )
        .init();

    let cfg = ConductorConfig {
        grace: Duration::from_secs(3),
        ..ConductorConfig::default()
    };
    let processes: Vec<ProcessRef> = vec![
        Arc::new(Ticker {
            name: "heartbeat",
            every: Duration::from_secs(1),
            flush: Duration::from_millis(100),
        }),
        Arc::new(Ticker {
            name: "drain",
            every: Duration::from_millis(2500),
            flush: Duration::from_secs(1),
        }),
        Arc::new(Stuck),
    ];

    let running = Conductor::builder(cfg)
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .with_processes(processes)
        .build()?
        .start(&CancellationToken::new());

    println!("[main] running, press Ctrl-C to stop");
    let report = running.then_stop().await;

    println!(
        "[main] cause={} elapsed={:?} grace={:?}",
        report.cause(),
        report.elapsed(),
        report.grace()
    );
    for r in report.outcomes() {
        match &r.outcome {
            StopOutcome::Stopped => println!("[main] {} stopped", r.process),
            StopOutcome::Failed(e) => println!("[main] {} failed to stop: {e}", r.process),
            StopOutcome::Abandoned => println!("[main] {} abandoned", r.process),
        }
    }
    Ok(())
}
