// src/supervisor/mod.rs

//! PID-file-guarded single-instance supervision.
//!
//! - [`task`] is the resolved task definition the supervisor acts on.
//! - [`core`] holds [`Supervisor`], which combines an instance registry and
//!   a process-control backend.

pub mod core;
pub mod task;

pub use self::core::{KillOutcome, Supervisor};
pub use task::TaskSpec;
