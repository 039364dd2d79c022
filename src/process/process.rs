//! # Process abstraction.
//!
//! This module defines the [`Process`] trait: an async unit of work that can be
//! run until completion or cancellation, stopped on demand and identified by
//! name. The common handle type is [`ProcessRef`], an `Arc<dyn Process>`
//! shared between the caller and the conductor.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;
use crate::process::StopContext;

/// Shared handle to a process.
pub type ProcessRef = Arc<dyn Process>;

/// # Independently running unit of work.
///
/// A `Process` has a stable [`name`](Process::name), an async [`run`](Process::run)
/// that receives a [`CancellationToken`], and an async [`stop`](Process::stop)
/// that receives a [`StopContext`] carrying the shutdown deadline.
///
/// ## Contract
/// - `run` is called at most once per conductor.
/// - `run` returning `Ok(())` or `Err(ProcessError::Canceled)` is a clean exit;
///   any other error triggers shutdown of every process.
/// - `stop` may be called while `run` is still in flight and must be safe to
///   call concurrently with it. It should be idempotent and return by the deadline.
/// - Errors from `stop` are reported, never escalated.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use conductor::{Process, ProcessError, StopContext};
///
/// struct Ticker {
///     halt: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Process for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
///         tokio::select! {
///             _ = ctx.cancelled() => Err(ProcessError::Canceled),
///             _ = self.halt.cancelled() => Ok(()),
///         }
///     }
///
///     async fn stop(&self, _ctx: StopContext) -> Result<(), ProcessError> {
///         self.halt.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Process: Send + Sync + 'static {
    /// Returns a stable, non-empty, human-readable name.
    fn name(&self) -> &str;

    /// Runs until completion, cancellation of `ctx`, or unrecoverable failure.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError>;

    /// Best-effort cleanup bounded by `ctx.deadline()`.
    async fn stop(&self, ctx: StopContext) -> Result<(), ProcessError>;
}
