//! # Process contract and the records that flow around it.
//!
//! - [`Process`] - trait every managed unit implements (`run` / `stop` / `name`)
//! - [`ProcessRef`] - shared handle (`Arc<dyn Process>`)
//! - [`StopContext`] - deadline passed to `stop`
//! - [`ProcessFailure`] / [`FailureStream`] - failure records and their reader

mod context;
mod failure;
#[allow(clippy::module_inception)]
mod process;

pub use context::StopContext;
pub use failure::{FailureStream, ProcessFailure};
pub use process::{Process, ProcessRef};
