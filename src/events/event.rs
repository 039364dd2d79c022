//! # Runtime events emitted by the conductor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: process execution flow (starting, completed, failed)
//! - **Trigger events**: what the monitor and signal listener observed
//! - **Shutdown events**: per-process stop outcomes and the overall result
//! - **Subscriber events**: delivery problems inside the subscriber set
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! process name, a reason and the grace period.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use conductor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProcessFailed)
//!     .with_process("http")
//!     .with_reason("bind: address in use");
//!
//! assert_eq!(ev.kind, EventKind::ProcessFailed);
//! assert_eq!(ev.process.as_deref(), Some("http"));
//! assert_eq!(ev.reason.as_deref(), Some("bind: address in use"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Run events ===
    /// A process runner is about to call `run`.
    ///
    /// Sets: `process`
    ProcessStarting,

    /// `run` returned cleanly (`Ok` or cancellation).
    ///
    /// Sets: `process`, `reason` ("cancelled" when the exit followed cancellation)
    ProcessCompleted,

    /// `run` returned an error; a failure record was queued.
    ///
    /// Sets: `process`, `reason`
    ProcessFailed,

    // === Trigger events ===
    /// The monitor took a failure record from the buffer.
    ///
    /// Sets: `process`, `reason`
    FailureObserved,

    /// The monitor saw the parent context cancelled.
    ContextCancelled,

    /// An OS signal arrived after the trigger was already armed.
    ///
    /// Sets: `reason` (signal name)
    SignalIgnored,

    /// The trigger fired; shutdown begins.
    ///
    /// Sets: `reason` (trigger cause), `process` (when a process caused it), `grace_ms`
    ShutdownRequested,

    // === Shutdown events ===
    /// `stop` is about to be called.
    ///
    /// Sets: `process`
    ProcessStopping,

    /// `stop` returned `Ok`.
    ///
    /// Sets: `process`
    ProcessStopped,

    /// `stop` returned an error.
    ///
    /// Sets: `process`, `reason`
    ProcessStopFailed,

    /// `stop` did not return before the deadline; its outcome is discarded.
    ///
    /// Sets: `process`, `grace_ms`
    ProcessAbandoned,

    /// Every `stop` returned within the grace period.
    ///
    /// Sets: `grace_ms`
    AllStoppedWithin,

    /// The grace period elapsed with some `stop` calls still pending.
    ///
    /// Sets: `grace_ms`, `reason` (abandoned processes)
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `process` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `process` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the process, if applicable.
    pub process: Option<Arc<str>>,
    /// Human-readable reason (errors, trigger cause, overflow details).
    pub reason: Option<Arc<str>>,
    /// Shutdown grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            process: None,
            reason: None,
            grace_ms: None,
        }
    }

    /// Attaches a process name.
    #[inline]
    pub fn with_process(mut self, process: impl Into<Arc<str>>) -> Self {
        self.process = Some(process.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_process(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_process(subscriber)
            .with_reason(info)
    }

    /// True for [`EventKind::SubscriberOverflow`]; such events never cause further overflow events.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
