use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use metarmap::errors::{Result, SupervisorError};
use metarmap::exec::{DetachedHandle, ProcessControl};
use metarmap::supervisor::TaskSpec;

/// A fake process control that:
/// - hands out increasing pids instead of spawning anything
/// - tracks which pids are "alive"
/// - records every termination request
/// - can be told to fail spawning for particular commands
/// - can be told that some pids ignore termination requests.
#[derive(Debug)]
pub struct FakeProcessControl {
    next_pid: AtomicU32,
    alive: Mutex<HashSet<u32>>,
    spawned: Mutex<Vec<(String, u32)>>,
    terminated: Mutex<Vec<u32>>,
    failing_cmds: Mutex<HashSet<String>>,
    stubborn: Mutex<HashSet<u32>>,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self::starting_at(40_000)
    }

    pub fn starting_at(first_pid: u32) -> Self {
        Self {
            next_pid: AtomicU32::new(first_pid),
            alive: Mutex::new(HashSet::new()),
            spawned: Mutex::new(Vec::new()),
            terminated: Mutex::new(Vec::new()),
            failing_cmds: Mutex::new(HashSet::new()),
            stubborn: Mutex::new(HashSet::new()),
        }
    }

    /// Make `spawn_detached` fail with `NotFound` for tasks running `cmd`.
    pub fn fail_spawning(&self, cmd: &str) {
        self.failing_cmds.lock().unwrap().insert(cmd.to_string());
    }

    /// Let `pid` accept termination requests but keep running.
    pub fn ignore_termination(&self, pid: u32) {
        self.stubborn.lock().unwrap().insert(pid);
    }

    /// Pretend an unrelated process with `pid` exists.
    pub fn add_alive(&self, pid: u32) {
        self.alive.lock().unwrap().insert(pid);
    }

    /// Pretend `pid` exited on its own.
    pub fn exit(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }

    pub fn spawned(&self) -> Vec<(String, u32)> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl Default for FakeProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for FakeProcessControl {
    fn spawn_detached(&self, task: &TaskSpec, _log: File) -> io::Result<DetachedHandle> {
        if self.failing_cmds.lock().unwrap().contains(&task.cmd) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such program: {}", task.cmd),
            ));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.alive.lock().unwrap().insert(pid);
        self.spawned.lock().unwrap().push((task.name.clone(), pid));
        Ok(DetachedHandle::untracked(task.name.clone(), pid))
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        self.terminated.lock().unwrap().push(pid);
        if self.stubborn.lock().unwrap().contains(&pid) {
            return Ok(());
        }
        if self.alive.lock().unwrap().remove(&pid) {
            Ok(())
        } else {
            Err(SupervisorError::Terminate {
                pid,
                source: io::Error::from_raw_os_error(3), // ESRCH
            })
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }
}
