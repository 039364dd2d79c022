//! End-to-end scenarios for the conductor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::{Conductor, SignalKind, StopOutcome, TriggerCause};
use crate::{
    config::ConductorConfig,
    error::{ConductorError, ProcessError},
    events::{Event, EventKind},
    policies::ExitPolicy,
    process::{Process, ProcessRef, StopContext},
    subscribers::Subscribe,
};

// ============================================================================
// Mock process
// ============================================================================

#[derive(Clone, Copy)]
enum RunBehaviour {
    UntilCancelled,
    FailNow,
    FailAfter(Duration),
    CompleteAfter(Duration),
    Panic,
}

#[derive(Clone, Copy)]
enum StopBehaviour {
    Quick,
    Sleep(Duration),
    AfterRunExit(Duration),
    Hang,
    Fail,
}

struct Mock {
    name: &'static str,
    run: RunBehaviour,
    stop: StopBehaviour,
    run_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    saw_cancel: AtomicBool,
    exited: CancellationToken,
}

impl Mock {
    fn arc(name: &'static str, run: RunBehaviour, stop: StopBehaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            run,
            stop,
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            saw_cancel: AtomicBool::new(false),
            exited: CancellationToken::new(),
        })
    }

    fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    async fn cancelled(&self, ctx: &CancellationToken) -> Result<(), ProcessError> {
        ctx.cancelled().await;
        self.saw_cancel.store(true, Ordering::SeqCst);
        Err(ProcessError::Canceled)
    }
}

#[async_trait]
impl Process for Mock {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let res = match self.run {
            RunBehaviour::UntilCancelled => self.cancelled(&ctx).await,
            RunBehaviour::FailNow => Err(ProcessError::fail(format!("{} broke", self.name))),
            RunBehaviour::FailAfter(d) => tokio::select! {
                _ = time::sleep(d) => Err(ProcessError::fail(format!("{} broke", self.name))),
                res = self.cancelled(&ctx) => res,
            },
            RunBehaviour::CompleteAfter(d) => {
                time::sleep(d).await;
                Ok(())
            }
            RunBehaviour::Panic => panic!("run exploded"),
        };
        self.exited.cancel();
        res
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ProcessError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        match self.stop {
            StopBehaviour::Quick => Ok(()),
            StopBehaviour::Sleep(d) => {
                time::sleep(d).await;
                Ok(())
            }
            StopBehaviour::AfterRunExit(d) => {
                ctx.bound(self.exited.cancelled()).await?;
                time::sleep(d).await;
                Ok(())
            }
            StopBehaviour::Hang => std::future::pending().await,
            StopBehaviour::Fail => Err(ProcessError::fail("cleanup incomplete")),
        }
    }
}

/// Records every event kind it receives, in delivery order.
#[derive(Default)]
struct Recorder(std::sync::Mutex<Vec<EventKind>>);

impl Recorder {
    fn seen(&self) -> Vec<EventKind> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn quiet_config() -> ConductorConfig {
    ConductorConfig {
        handle_signals: false,
        ..ConductorConfig::default()
    }
}

fn build(cfg: ConductorConfig, procs: &[Arc<Mock>]) -> (Conductor, broadcast::Receiver<Event>) {
    let conductor = Conductor::builder(cfg)
        .with_processes(procs.iter().map(|p| Arc::clone(p) as ProcessRef))
        .build()
        .expect("build conductor");
    let events = conductor.bus.subscribe();
    (conductor, events)
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

fn has(events: &[Event], kind: EventKind, process: &str) -> bool {
    events
        .iter()
        .any(|e| e.kind == kind && e.process.as_deref() == Some(process))
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn failure_after_two_seconds_stops_both_processes() {
    let failing = Mock::arc(
        "failing",
        RunBehaviour::FailAfter(Duration::from_secs(2)),
        StopBehaviour::Quick,
    );
    let steady = Mock::arc("steady", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let (conductor, mut events) = build(quiet_config(), &[failing.clone(), steady.clone()]);

    let started = Instant::now();
    let mut report = conductor.start(&CancellationToken::new()).then_stop().await;

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(
        report.cause(),
        &TriggerCause::ProcessFailed {
            process: "failing".into(),
            error: "execution failed: failing broke".into(),
        }
    );
    assert!(report.all_stopped());
    assert_eq!(failing.stops(), 1);
    assert_eq!(steady.stops(), 1);

    let failures = report.errors().drain();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name(), "failing");

    let events = drain(&mut events);
    assert!(has(&events, EventKind::FailureObserved, "failing"));
    assert_eq!(count(&events, EventKind::ShutdownRequested), 1);
    assert!(has(&events, EventKind::ProcessStopped, "failing"));
    assert!(has(&events, EventKind::ProcessStopped, "steady"));
    assert_eq!(count(&events, EventKind::AllStoppedWithin), 1);
}

#[tokio::test(start_paused = true)]
async fn external_interrupt_cancels_runs_and_stops_concurrently() {
    let procs: Vec<Arc<Mock>> = ["a", "b", "c"]
        .into_iter()
        .map(|n| {
            Mock::arc(
                n,
                RunBehaviour::UntilCancelled,
                StopBehaviour::AfterRunExit(Duration::from_secs(1)),
            )
        })
        .collect();
    let (conductor, mut events) = build(quiet_config(), &procs);

    let running = conductor.start(&CancellationToken::new());
    assert!(running.trigger().arm(TriggerCause::Signal(SignalKind::Interrupt)));

    let started = Instant::now();
    let report = running.then_stop().await;

    assert_eq!(report.cause(), &TriggerCause::Signal(SignalKind::Interrupt));
    assert!(report.all_stopped());
    assert!(started.elapsed() < Duration::from_secs(2));
    for p in &procs {
        assert!(p.saw_cancel.load(Ordering::SeqCst), "{} missed cancellation", p.name);
        assert_eq!(p.stops(), 1);
    }

    let events = drain(&mut events);
    assert_eq!(count(&events, EventKind::ShutdownRequested), 1);
    assert_eq!(count(&events, EventKind::ProcessStopping), 3);
    assert_eq!(count(&events, EventKind::ProcessFailed), 0);
}

#[tokio::test(start_paused = true)]
async fn hanging_stop_is_abandoned_at_the_grace_boundary() {
    let stuck = Mock::arc("stuck", RunBehaviour::UntilCancelled, StopBehaviour::Hang);
    let (conductor, mut events) = build(quiet_config(), &[stuck.clone()]);

    let running = conductor.start(&CancellationToken::new());
    running.trigger().request();

    let started = Instant::now();
    let report = running.then_stop().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_millis(5100));
    assert_eq!(report.outcome_of("stuck"), Some(&StopOutcome::Abandoned));
    assert_eq!(report.abandoned(), vec!["stuck"]);
    assert!(report.grace_exceeded());

    let events = drain(&mut events);
    assert!(!has(&events, EventKind::ProcessStopped, "stuck"));
    assert!(has(&events, EventKind::ProcessAbandoned, "stuck"));
    assert_eq!(count(&events, EventKind::GraceExceeded), 1);
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_failures_and_signal_shut_down_once() {
    let procs: Vec<Arc<Mock>> = (0..8)
        .map(|_| Mock::arc("racer", RunBehaviour::FailNow, StopBehaviour::Quick))
        .collect();
    let (conductor, mut events) = build(quiet_config(), &procs);

    let running = conductor.start(&CancellationToken::new());
    let trigger = running.trigger();
    let signal = tokio::spawn(async move { trigger.arm(TriggerCause::Signal(SignalKind::Terminate)) });

    let report = running.then_stop().await;
    signal.await.expect("signal task");

    for p in &procs {
        assert_eq!(p.run_calls.load(Ordering::SeqCst), 1);
        assert_eq!(p.stops(), 1);
    }
    assert_eq!(report.outcomes().len(), 8);

    let events = drain(&mut events);
    assert_eq!(count(&events, EventKind::ShutdownRequested), 1);
    assert_eq!(count(&events, EventKind::ProcessStopping), 8);
    assert_eq!(count(&events, EventKind::AllStoppedWithin), 1);
}

#[tokio::test(start_paused = true)]
async fn unread_failures_never_block_runners() {
    const K: usize = 32;
    let procs: Vec<Arc<Mock>> = (0..K)
        .map(|_| Mock::arc("doomed", RunBehaviour::FailNow, StopBehaviour::Quick))
        .collect();
    let (conductor, _events) = build(quiet_config(), &procs);

    let report = conductor.start(&CancellationToken::new()).then_stop().await;

    // The stream ends only once every runner has dropped its sender.
    let failures = time::timeout(Duration::from_secs(1), report.into_errors().collect::<Vec<_>>())
        .await
        .expect("runners finished");
    assert_eq!(failures.len(), K);
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_not_failure() {
    let canceled = Mock::arc("canceled", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let (conductor, mut events) = build(quiet_config(), &[canceled.clone()]);

    let parent = CancellationToken::new();
    let running = conductor.start(&parent);
    parent.cancel();
    let mut report = running.then_stop().await;

    assert_eq!(report.cause(), &TriggerCause::Cancelled);
    assert!(report.errors().drain().is_empty());

    let events = drain(&mut events);
    assert!(events.iter().any(|e| e.kind == EventKind::ContextCancelled));
    assert_eq!(count(&events, EventKind::ProcessFailed), 0);
}

#[tokio::test(start_paused = true)]
async fn clean_exit_does_not_stop_siblings_by_default() {
    let quick = Mock::arc(
        "quick",
        RunBehaviour::CompleteAfter(Duration::from_millis(10)),
        StopBehaviour::Quick,
    );
    let steady = Mock::arc("steady", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let (conductor, _events) = build(quiet_config(), &[quick.clone(), steady.clone()]);

    let running = conductor.start(&CancellationToken::new());
    time::sleep(Duration::from_secs(1)).await;
    assert!(!running.is_triggered());
    assert!(!steady.saw_cancel.load(Ordering::SeqCst));

    running.trigger().request();
    let report = running.then_stop().await;
    assert_eq!(report.cause(), &TriggerCause::Requested);
    assert_eq!(quick.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn clean_exit_stops_siblings_under_stop_on_completion() {
    let quick = Mock::arc(
        "quick",
        RunBehaviour::CompleteAfter(Duration::from_millis(10)),
        StopBehaviour::Quick,
    );
    let steady = Mock::arc("steady", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let cfg = ConductorConfig {
        exit_policy: ExitPolicy::StopOnCompletion,
        ..quiet_config()
    };
    let (conductor, _events) = build(cfg, &[quick, steady.clone()]);

    let report = conductor.start(&CancellationToken::new()).then_stop().await;

    assert_eq!(
        report.cause(),
        &TriggerCause::Completed {
            process: "quick".into()
        }
    );
    assert_eq!(steady.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_triggered_shutdown_gets_full_grace() {
    let slow = Mock::arc(
        "slow",
        RunBehaviour::UntilCancelled,
        StopBehaviour::Sleep(Duration::from_secs(3)),
    );
    let (conductor, _events) = build(quiet_config(), &[slow]);

    let parent = CancellationToken::new();
    parent.cancel();
    let report = conductor.start(&parent).then_stop().await;

    assert_eq!(report.cause(), &TriggerCause::Cancelled);
    assert_eq!(report.outcome_of("slow"), Some(&StopOutcome::Stopped));
}

#[tokio::test(start_paused = true)]
async fn run_panic_triggers_shutdown_and_stop_failure_is_reported() {
    let panicky = Mock::arc("panicky", RunBehaviour::Panic, StopBehaviour::Fail);
    let (conductor, mut events) = build(quiet_config(), &[panicky.clone()]);

    let report = conductor.start(&CancellationToken::new()).then_stop().await;

    assert_eq!(
        report.cause(),
        &TriggerCause::ProcessFailed {
            process: "panicky".into(),
            error: "panicked: run exploded".into(),
        }
    );
    assert_eq!(
        report.outcome_of("panicky"),
        Some(&StopOutcome::Failed(ProcessError::fail("cleanup incomplete")))
    );
    assert_eq!(panicky.stops(), 1);

    let events = drain(&mut events);
    assert!(has(&events, EventKind::ProcessStopFailed, "panicky"));
}

#[tokio::test(start_paused = true)]
async fn empty_set_shuts_down_on_request() {
    let (conductor, _events) = build(quiet_config(), &[]);
    let trigger = conductor.trigger();
    let running = conductor.start(&CancellationToken::new());
    trigger.request();

    let mut report = running.then_stop().await;
    assert!(report.outcomes().is_empty());
    assert!(report.all_stopped());
    assert!(report.errors().try_next().is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_running_cancels_run_contexts() {
    let steady = Mock::arc("steady", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let (conductor, _events) = build(quiet_config(), &[steady.clone()]);

    let running = conductor.start(&CancellationToken::new());
    drop(running);

    steady.exited.cancelled().await;
    assert!(steady.saw_cancel.load(Ordering::SeqCst));
    assert_eq!(steady.stops(), 0);
}

#[tokio::test]
async fn signal_registration_is_released_after_shutdown() {
    let steady = Mock::arc("steady", RunBehaviour::UntilCancelled, StopBehaviour::Quick);
    let (conductor, _events) = build(ConductorConfig::default(), &[steady]);
    assert!(conductor.signals.is_some());

    let running = conductor.start(&CancellationToken::new());
    running.trigger().request();
    let report = running.then_stop().await;
    assert!(report.all_stopped());
}

#[test]
fn building_outside_a_runtime_fails() {
    let err = Conductor::builder(quiet_config())
        .build()
        .err()
        .expect("no runtime");
    assert!(matches!(err, ConductorError::NoRuntime));
}

#[tokio::test]
async fn subscribers_receive_final_events_before_then_stop_returns() {
    let failing = Mock::arc("failing", RunBehaviour::FailNow, StopBehaviour::Quick);
    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
    let conductor = Conductor::builder(quiet_config())
        .with_subscribers(subs)
        .with_process(failing)
        .build()
        .expect("build conductor");

    let report = conductor.start(&CancellationToken::new()).then_stop().await;
    assert!(report.all_stopped());

    let seen = recorder.seen();
    assert!(seen.contains(&EventKind::ShutdownRequested));
    assert!(seen.contains(&EventKind::ProcessStopped));
    assert_eq!(seen.last(), Some(&EventKind::AllStoppedWithin));
}

#[tokio::test(start_paused = true)]
async fn subscribers_receive_grace_exceeded_before_then_stop_returns() {
    let stuck = Mock::arc("stuck", RunBehaviour::UntilCancelled, StopBehaviour::Hang);
    let recorder = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
    let running = Conductor::builder(quiet_config())
        .with_subscribers(subs)
        .with_process(stuck)
        .build()
        .expect("build conductor")
        .start(&CancellationToken::new());
    running.trigger().request();

    let report = running.then_stop().await;
    assert!(report.grace_exceeded());

    let seen = recorder.seen();
    assert!(seen.contains(&EventKind::ProcessAbandoned));
    assert_eq!(seen.last(), Some(&EventKind::GraceExceeded));
}
