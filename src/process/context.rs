//! # Deadline handed to `Process::stop`.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::error::ProcessError;

/// Deadline used when `grace` overflows the clock: roughly thirty years out.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Shutdown context: the shared deadline all `stop` calls must respect.
///
/// Every process receives a copy carrying the same deadline. The conductor
/// stops waiting at that instant whether or not `stop` has returned.
#[derive(Clone, Copy, Debug)]
pub struct StopContext {
    deadline: Instant,
    grace: Duration,
}

impl StopContext {
    /// Creates a context whose deadline is `grace` from now.
    ///
    /// A `grace` too large for the clock is treated as "no practical deadline".
    pub fn with_grace(grace: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(grace)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { deadline, grace }
    }

    /// The instant after which the conductor no longer waits.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The full grace period this context was created with.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Time left until the deadline (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Completes at the deadline.
    pub async fn expired(&self) {
        time::sleep_until(self.deadline).await;
    }

    /// Runs `fut` until it completes or the deadline passes.
    ///
    /// Elapse maps to [`ProcessError::Timeout`] carrying the grace period.
    ///
    /// # Example
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// use std::time::Duration;
    /// use conductor::{ProcessError, StopContext};
    ///
    /// let ctx = StopContext::with_grace(Duration::from_millis(10));
    /// let res = ctx.bound(std::future::pending::<()>()).await;
    /// assert!(matches!(res, Err(ProcessError::Timeout { .. })));
    /// # }
    /// ```
    pub async fn bound<F>(&self, fut: F) -> Result<F::Output, ProcessError>
    where
        F: Future,
    {
        time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_elapsed| ProcessError::Timeout {
                timeout: self.grace,
            })
    }
}
