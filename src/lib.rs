//! # conductor
//!
//! **conductor** starts a fixed set of async processes concurrently, waits for
//! the first reason to stop, and shuts every process down within a bounded
//! grace period.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Process    │   │   Process    │   │   Process    │
//!     │  run / stop  │   │  run / stop  │   │  run / stop  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Conductor                                                        │
//! │  - runners (one per process, run(child of parent ctx))            │
//! │  - failure buffer (mpsc, one slot per process, never blocks)      │
//! │  - monitor (first failure | parent cancelled)                     │
//! │  - signal listener (SIGINT / SIGTERM)                             │
//! │  - Trigger (first cause wins)                                     │
//! │  - Bus ──► SubscriberSet ──► LogWriter (tracing) / custom         │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 ▼
//!                     Running::then_stop()
//!                       stop × N, concurrently, until now + grace
//!                                 ▼
//!                          ShutdownReport
//! ```
//!
//! ## What stops the set
//! | Cause                          | Trigger cause                  |
//! |--------------------------------|--------------------------------|
//! | `run` returns an error/panics  | [`TriggerCause::ProcessFailed`]|
//! | parent token cancelled         | [`TriggerCause::Cancelled`]    |
//! | SIGINT / SIGTERM               | [`TriggerCause::Signal`]       |
//! | [`Trigger::request`]           | [`TriggerCause::Requested`]    |
//! | clean exit + `StopOnCompletion`| [`TriggerCause::Completed`]    |
//!
//! A clean exit, or `Err(ProcessError::Canceled)`, is never a failure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use conductor::{Conductor, ConductorConfig, Process, ProcessError, ProcessRef, StopContext};
//!
//! struct Worker {
//!     halt: CancellationToken,
//! }
//!
//! #[async_trait]
//! impl Process for Worker {
//!     fn name(&self) -> &str { "worker" }
//!
//!     async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
//!         tokio::select! {
//!             _ = ctx.cancelled() => Err(ProcessError::Canceled),
//!             _ = self.halt.cancelled() => Ok(()),
//!         }
//!     }
//!
//!     async fn stop(&self, _ctx: StopContext) -> Result<(), ProcessError> {
//!         self.halt.cancel();
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = ConductorConfig::default();
//!     cfg.grace = Duration::from_secs(2);
//!
//!     let worker: ProcessRef = Arc::new(Worker { halt: CancellationToken::new() });
//!     let conductor = Conductor::builder(cfg).with_process(worker).build()?;
//!
//!     let parent = CancellationToken::new();
//!     let running = conductor.start(&parent);
//!     parent.cancel();
//!
//!     let report = running.then_stop().await;
//!     assert!(report.all_stopped());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use config::{ConductorConfig, DEFAULT_GRACE};
pub use crate::core::{
    Conductor, ConductorBuilder, Running, ShutdownReport, SignalKind, StopOutcome, StopReport,
    Trigger, TriggerCause,
};
pub use error::{ConductorError, ProcessError};
pub use events::{Event, EventKind};
pub use policies::ExitPolicy;
pub use process::{FailureStream, Process, ProcessFailure, ProcessRef, StopContext};
pub use subscribers::{LogWriter, Subscribe};
