//! # Conductor: concurrent start, first-cause trigger, graceful shutdown.
//!
//! The [`Conductor`] owns a fixed set of processes, the shutdown [`Trigger`],
//! the failure buffer, the event bus and the OS signal registration.
//!
//! ## Lifecycle
//! ```text
//! Conductor::new / builder().build()      register signals, allocate buffer + trigger
//!        │
//!        ▼
//! Conductor::start(&parent) ──► Running  (returns immediately)
//!   ├─► runner × N:  ProcessStarting ─► run(child of parent) ─► Completed | Failed ─► try_send
//!   ├─► monitor:     select { failure, parent cancelled, already armed } ─► arm once
//!   └─► signals:     SIGINT/SIGTERM ─► arm (later signals ignored until release)
//!        │
//!        ▼
//! Running::then_stop()
//!   ├─► wait trigger.armed()
//!   ├─► publish ShutdownRequested, cancel run context
//!   ├─► stop fan-out with a fresh deadline (grace)
//!   ├─► stop signal delivery, flush the final events to subscribers
//!   └─► ShutdownReport { cause, outcomes, failures }
//! ```
//!
//! `start` and `then_stop` consume their receiver, so a conductor is started
//! once and shut down once.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use conductor::{Conductor, Process, ProcessError, ProcessRef, StopContext};
//!
//! struct Flaky;
//!
//! #[async_trait]
//! impl Process for Flaky {
//!     fn name(&self) -> &str { "flaky" }
//!     async fn run(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
//!         Err(ProcessError::fail("lost connection"))
//!     }
//!     async fn stop(&self, _ctx: StopContext) -> Result<(), ProcessError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), conductor::ConductorError> {
//!     let flaky: ProcessRef = Arc::new(Flaky);
//!     let report = Conductor::new(vec![flaky])?
//!         .start(&CancellationToken::new())
//!         .then_stop()
//!         .await;
//!
//!     assert_eq!(report.cause().process(), Some("flaky"));
//!     assert!(report.all_stopped());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{
    builder::ConductorBuilder,
    monitor::monitor,
    report::ShutdownReport,
    runner::{RunnerParams, run_process},
    shutdown::stop_all,
    signals::{self, Signals},
    trigger::{Trigger, TriggerCause},
};
use crate::{
    config::ConductorConfig,
    error::ConductorError,
    events::{Bus, Event, EventKind},
    process::{FailureStream, ProcessFailure, ProcessRef},
    subscribers::LogWriter,
};

/// How long `then_stop` waits for subscribers to receive the final events.
const SUBSCRIBER_FLUSH: Duration = Duration::from_secs(1);

/// A constructed, not yet started conductor.
pub struct Conductor {
    pub(super) cfg: ConductorConfig,
    pub(super) processes: Arc<[ProcessRef]>,
    pub(super) trigger: Trigger,
    pub(super) failures_tx: mpsc::Sender<ProcessFailure>,
    pub(super) failures_rx: mpsc::Receiver<ProcessFailure>,
    pub(super) bus: Bus,
    pub(super) signals: Option<Signals>,
    /// Bus to subscriber forwarder; `None` without subscribers.
    pub(super) listener: Option<JoinHandle<()>>,
    /// Cancelled once shutdown is complete; ends the signal and event listeners.
    pub(super) release: CancellationToken,
}

impl Conductor {
    /// Builds a conductor with default configuration and the [`LogWriter`] subscriber.
    ///
    /// # Errors
    /// See [`ConductorBuilder::build`].
    pub fn new(processes: impl IntoIterator<Item = ProcessRef>) -> Result<Self, ConductorError> {
        Self::builder(ConductorConfig::default())
            .with_subscribers(vec![Arc::new(LogWriter::new())])
            .with_processes(processes)
            .build()
    }

    /// Returns a builder for custom configuration and subscribers.
    pub fn builder(cfg: ConductorConfig) -> ConductorBuilder {
        ConductorBuilder::new(cfg)
    }

    /// The configuration this conductor was built with.
    pub fn config(&self) -> &ConductorConfig {
        &self.cfg
    }

    /// Handle to the shutdown trigger, usable before and after `start`.
    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Launches every process, the monitor and the signal listener, then returns.
    ///
    /// Each `run` receives a child of `parent`; cancelling `parent` is one of the
    /// ways to trigger shutdown.
    pub fn start(self, parent: &CancellationToken) -> Running {
        let run_token = parent.child_token();

        let failures = tokio::spawn(monitor(
            self.failures_rx,
            parent.clone(),
            self.trigger.clone(),
            self.bus.clone(),
        ));

        let signals = self.signals.map(|s| {
            tokio::spawn(signals::listen(
                s,
                self.trigger.clone(),
                self.bus.clone(),
                self.release.clone(),
            ))
        });

        let params = RunnerParams {
            bus: self.bus.clone(),
            failures: self.failures_tx,
            trigger: self.trigger.clone(),
            exit_policy: self.cfg.exit_policy,
        };
        for process in self.processes.iter() {
            tokio::spawn(run_process(
                Arc::clone(process),
                run_token.clone(),
                params.clone(),
            ));
        }

        Running {
            cfg: self.cfg,
            processes: self.processes,
            trigger: self.trigger,
            bus: self.bus,
            failures,
            signals,
            listener: self.listener,
            run_guard: run_token.drop_guard(),
            release_guard: self.release.drop_guard(),
        }
    }
}

/// A started conductor.
///
/// Dropping it without calling [`then_stop`](Self::then_stop) cancels every
/// `run` context and releases the signal registration, but calls no `stop`.
pub struct Running {
    cfg: ConductorConfig,
    processes: Arc<[ProcessRef]>,
    trigger: Trigger,
    bus: Bus,
    failures: JoinHandle<FailureStream>,
    signals: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
    run_guard: DropGuard,
    release_guard: DropGuard,
}

impl Running {
    /// Handle to the shutdown trigger; [`Trigger::request`] starts shutdown.
    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// True once shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.trigger.is_armed()
    }

    /// Waits for the trigger, then stops every process within the grace period.
    ///
    /// Never waits on process code past the deadline. Stop failures end up in
    /// the report; they are never retried or escalated.
    pub async fn then_stop(self) -> ShutdownReport {
        self.trigger.armed().await;
        let cause = self
            .trigger
            .cause()
            .cloned()
            .unwrap_or(TriggerCause::Requested);

        let mut ev = Event::new(EventKind::ShutdownRequested)
            .with_reason(cause.to_string())
            .with_grace(self.cfg.grace);
        if let Some(process) = cause.process() {
            ev = ev.with_process(process);
        }
        self.bus.publish(ev);

        drop(self.run_guard);
        let (outcomes, elapsed) = stop_all(&self.processes, self.cfg.grace, &self.bus).await;

        drop(self.release_guard);
        if let Some(listener) = self.signals {
            if let Err(e) = listener.await {
                tracing::warn!(error = %e, "signal listener ended abnormally");
            }
        }
        if let Some(listener) = self.listener {
            match time::timeout(SUBSCRIBER_FLUSH, listener).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "event listener ended abnormally"),
                Err(_elapsed) => {
                    tracing::warn!(timeout = ?SUBSCRIBER_FLUSH, "subscribers did not drain in time");
                }
            }
        }
        let failures = match self.failures.await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "monitor ended abnormally, failure records lost");
                FailureStream::empty()
            }
        };

        ShutdownReport {
            cause,
            outcomes,
            grace: self.cfg.grace,
            elapsed,
            failures,
        }
    }
}
