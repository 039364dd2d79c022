//! # OS signal registration owned by a conductor.
//!
//! [`Signals`] registers interest in termination signals when it is created.
//! The conductor listens from construction to the end of shutdown; after that
//! the streams are dropped and signals are no longer delivered to it.
//!
//! Tokio does not restore the default disposition once a handler is
//! installed: after shutdown SIGINT/SIGTERM no longer terminate the process.
//! Callers that want Ctrl-C to kill the process afterwards must exit or
//! install their own handling.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`] (reported as [`SignalKind::Interrupt`])

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::{
    core::trigger::{Trigger, TriggerCause},
    events::{Bus, Event, EventKind},
};

/// Termination signal observed by the conductor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Interrupt => f.write_str("SIGINT"),
            SignalKind::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered signal streams.
#[cfg(unix)]
pub(crate) struct Signals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    /// Registers SIGINT and SIGTERM. Must run inside a Tokio runtime.
    pub(crate) fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind as Kind, signal};

        Ok(Self {
            sigint: signal(Kind::interrupt())?,
            sigterm: signal(Kind::terminate())?,
        })
    }

    /// Waits for the next registered signal; `None` once the signal driver is gone.
    pub(crate) async fn recv(&mut self) -> Option<SignalKind> {
        tokio::select! {
            Some(()) = self.sigint.recv()  => Some(SignalKind::Interrupt),
            Some(()) = self.sigterm.recv() => Some(SignalKind::Terminate),
            else => None,
        }
    }
}

/// Registered signal streams.
#[cfg(not(unix))]
pub(crate) struct Signals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl Signals {
    /// Registers Ctrl-C. Must run inside a Tokio runtime.
    pub(crate) fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Waits for the next registered signal; `None` once the signal driver is gone.
    pub(crate) async fn recv(&mut self) -> Option<SignalKind> {
        self.ctrl_c.recv().await.map(|()| SignalKind::Interrupt)
    }
}

/// Arms `trigger` on the first signal and absorbs later ones until `release`.
///
/// `signals` is dropped on return, which stops delivery to this conductor. The
/// OS-level handler stays installed for the life of the process.
pub(crate) async fn listen(
    mut signals: Signals,
    trigger: Trigger,
    bus: Bus,
    release: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = release.cancelled() => break,
            kind = signals.recv() => {
                let Some(kind) = kind else { break };
                if !trigger.arm(TriggerCause::Signal(kind)) {
                    bus.publish(Event::new(EventKind::SignalIgnored).with_reason(kind.to_string()));
                }
            }
        }
    }
}
