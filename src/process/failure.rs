//! # Failure records and the stream handed back to the caller.
//!
//! A [`ProcessFailure`] is queued by a runner when `run` returns an error. The
//! queue is a bounded `mpsc` channel sized to the number of processes: each
//! runner sends at most once, so a send never waits even if nobody reads.
//!
//! ```text
//! runner 1 ──try_send──┐
//! runner 2 ──try_send──┼──► [mpsc, cap = N] ──► monitor (takes the first record)
//! runner N ──try_send──┘                          │
//!                                                 └──► FailureStream { first, rx }
//! ```

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::ProcessError;
use crate::process::ProcessRef;

/// A process paired with the error its `run` returned.
#[derive(Clone)]
pub struct ProcessFailure {
    /// The process that failed.
    pub process: ProcessRef,
    /// The error it reported.
    pub error: ProcessError,
}

impl ProcessFailure {
    /// Name of the failed process.
    pub fn name(&self) -> &str {
        self.process.name()
    }
}

impl fmt::Debug for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessFailure")
            .field("process", &self.process.name())
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process {} failed: {}", self.process.name(), self.error)
    }
}

/// Read-only stream of failure records.
///
/// Yields the record the monitor consumed (if any) first, then every record
/// still buffered or sent later. Reading it is optional.
///
/// `next().await` (via [`futures::StreamExt`]) ends only once every runner has
/// exited; use [`try_next`](Self::try_next) or [`drain`](Self::drain) to read
/// without waiting on processes whose `run` may never return.
pub struct FailureStream {
    first: Option<ProcessFailure>,
    rx: mpsc::Receiver<ProcessFailure>,
}

impl FailureStream {
    pub(crate) fn new(first: Option<ProcessFailure>, rx: mpsc::Receiver<ProcessFailure>) -> Self {
        Self { first, rx }
    }

    /// A stream that yields nothing.
    pub(crate) fn empty() -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self { first: None, rx }
    }

    /// Returns the next record that is already available, without waiting.
    pub fn try_next(&mut self) -> Option<ProcessFailure> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        self.rx.try_recv().ok()
    }

    /// Collects every record that is already available, without waiting.
    pub fn drain(&mut self) -> Vec<ProcessFailure> {
        let mut out = Vec::new();
        while let Some(f) = self.try_next() {
            out.push(f);
        }
        out
    }
}

impl Stream for FailureStream {
    type Item = ProcessFailure;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(first) = this.first.take() {
            return Poll::Ready(Some(first));
        }
        this.rx.poll_recv(cx)
    }
}

impl fmt::Debug for FailureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureStream")
            .field("first", &self.first)
            .field("buffered", &self.rx.len())
            .finish()
    }
}
