// src/exec/handle.rs

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

use super::signal;

/// Handle to a task instance that was started and left running.
///
/// Nothing here blocks: callers that care about the outcome poll with
/// [`try_wait`](Self::try_wait) or bound the wait with
/// [`wait_for_exit`](Self::wait_for_exit). Dropping the handle leaves the
/// process running.
#[derive(Debug)]
pub struct DetachedHandle {
    task: String,
    pid: u32,
    child: Option<Child>,
}

impl DetachedHandle {
    /// Handle owning the spawned child.
    pub fn new(task: impl Into<String>, pid: u32, child: Child) -> Self {
        Self {
            task: task.into(),
            pid,
            child: Some(child),
        }
    }

    /// Handle that only knows the pid (e.g. a simulated process).
    pub fn untracked(task: impl Into<String>, pid: u32) -> Self {
        Self {
            task: task.into(),
            pid,
            child: None,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Exit status if the process has already finished.
    ///
    /// Always `Ok(None)` for untracked handles.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => Ok(None),
        }
    }

    /// Wait at most `timeout` for the process to exit. Returns `true` if it
    /// did.
    pub async fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(tokio::time::timeout(timeout, child.wait()).await, Ok(Ok(_))),
            None => signal::wait_for_exit(self.pid, timeout).await,
        }
    }
}
