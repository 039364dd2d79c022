//! Runtime core: start, trigger and shutdown.
//!
//! The public API from this module is [`Conductor`] / [`Running`], the
//! [`Trigger`] handle and the [`ShutdownReport`] returned by shutdown.
//!
//! Internal modules:
//! - [`runner`]: runs one process and reports its outcome;
//! - [`monitor`]: arms the trigger on the first failure or parent cancellation;
//! - [`signals`]: OS signal registration and listener;
//! - [`trigger`]: one-shot, race-tolerant shutdown trigger;
//! - [`shutdown`]: deadline-bounded stop fan-out;
//! - [`conductor`]: wires the above together.

mod builder;
mod conductor;
mod monitor;
mod report;
mod runner;
mod shutdown;
mod signals;
mod trigger;

#[cfg(test)]
mod tests;

pub use builder::ConductorBuilder;
pub use conductor::{Conductor, Running};
pub use report::{ShutdownReport, StopOutcome, StopReport};
pub use signals::SignalKind;
pub use trigger::{Trigger, TriggerCause};
