use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{conductor::Conductor, signals::Signals, trigger::Trigger};
use crate::{
    config::ConductorConfig,
    error::ConductorError,
    events::{Bus, Event},
    process::ProcessRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Conductor`] with custom configuration and subscribers.
pub struct ConductorBuilder {
    cfg: ConductorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    processes: Vec<ProcessRef>,
}

impl ConductorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ConductorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            processes: Vec::new(),
        }
    }

    /// Sets event subscribers for diagnostics.
    ///
    /// Subscribers receive every lifecycle event through dedicated workers with
    /// bounded queues. Without subscribers events are published and dropped.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends one process. Insertion order is start order and report order.
    pub fn with_process(mut self, process: ProcessRef) -> Self {
        self.processes.push(process);
        self
    }

    /// Appends processes in iteration order.
    pub fn with_processes(mut self, processes: impl IntoIterator<Item = ProcessRef>) -> Self {
        self.processes.extend(processes);
        self
    }

    /// Builds the conductor.
    ///
    /// Allocates the trigger, the failure buffer (one slot per process) and the
    /// event bus, spawns subscriber workers and, if configured, registers OS
    /// signal interest.
    ///
    /// # Errors
    /// - [`ConductorError::NoRuntime`] outside a Tokio runtime
    /// - [`ConductorError::Signal`] if signal registration fails
    pub fn build(self) -> Result<Conductor, ConductorError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConductorError::NoRuntime);
        }
        let signals = if self.cfg.handle_signals {
            Some(Signals::register()?)
        } else {
            None
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let release = CancellationToken::new();
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let listener = subscriber_listener(bus.subscribe(), subs, release.clone());

        let (failures_tx, failures_rx) = mpsc::channel(self.processes.len().max(1));

        Ok(Conductor {
            cfg: self.cfg,
            processes: self.processes.into(),
            trigger: Trigger::new(),
            failures_tx,
            failures_rx,
            bus,
            signals,
            listener,
            release,
        })
    }
}

/// Forwards bus events to the subscriber set until `release` fires.
///
/// On release, events already queued on the bus are still forwarded and the
/// subscriber workers drain their queues before the task ends; anything
/// published afterwards (late runners, abandoned stops) is dropped.
///
/// Returns `None` when there is nobody to forward to.
fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    release: CancellationToken,
) -> Option<JoinHandle<()>> {
    if subs.is_empty() {
        return None;
    }
    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => subs.emit(ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = release.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => subs.emit(ev),
                            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        subs.shutdown().await;
    }))
}
