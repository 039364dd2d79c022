//! Lifecycle policies.
//!
//! ## Contents
//! - [`ExitPolicy`] what a clean `run` exit means for sibling processes
//!
//! ## Defaults
//! - `ExitPolicy::Ignore`: only failures, cancellation and signals stop the set.

mod exit;

pub use exit::ExitPolicy;
