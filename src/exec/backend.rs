// src/exec/backend.rs

//! Pluggable process-control abstraction.
//!
//! The supervisor talks to a `ProcessControl` instead of calling
//! `spawn`/`kill` directly. Production uses [`RealProcessControl`]; tests
//! provide an implementation that hands out fake pids and records which
//! ones were terminated.

use std::fs::File;
use std::io;

use crate::errors::Result;
use crate::exec::{DetachedHandle, command, signal};
use crate::supervisor::TaskSpec;

/// Trait abstracting how task processes are started, stopped and probed.
pub trait ProcessControl: Send + Sync {
    /// Start `task` without waiting for it, sending its combined output to
    /// `log`.
    fn spawn_detached(&self, task: &TaskSpec, log: File) -> io::Result<DetachedHandle>;

    /// Issue one termination request for `pid`. The outcome is not verified.
    fn terminate(&self, pid: u32) -> Result<()>;

    /// Whether a process with this pid currently exists.
    fn is_alive(&self, pid: u32) -> bool;
}

/// OS-backed process control (`tokio::process` + `kill(2)`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RealProcessControl;

impl ProcessControl for RealProcessControl {
    fn spawn_detached(&self, task: &TaskSpec, log: File) -> io::Result<DetachedHandle> {
        command::spawn_detached(task, log)
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        signal::terminate(pid)
    }

    fn is_alive(&self, pid: u32) -> bool {
        signal::is_alive(pid)
    }
}
