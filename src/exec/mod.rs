// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] spawns a task detached, with its output in the task log.
//! - [`signal`] wraps `kill(2)` for termination and liveness probes.
//! - [`handle`] is the non-blocking handle returned for each started task.
//! - [`backend`] defines the `ProcessControl` seam used by the supervisor.

pub mod backend;
pub mod command;
pub mod handle;
pub mod signal;

pub use backend::{ProcessControl, RealProcessControl};
pub use handle::DetachedHandle;
