// src/supervisor/core.rs

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::exec::{DetachedHandle, ProcessControl};
use crate::registry::InstanceRegistry;
use crate::supervisor::TaskSpec;
use crate::types::{InstanceState, LogMode};

const LIVENESS_POLL: Duration = Duration::from_millis(50);

/// Result of an explicit `kill` of a task's recorded instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// Nothing was recorded for the task.
    NotRecorded,
    /// The recorded process was already gone; the sentinel was cleared.
    AlreadyExited(u32),
    /// The process exited after the termination request; the sentinel was
    /// cleared.
    Exited(u32),
    /// The process was still alive when the timeout elapsed; the sentinel
    /// was kept.
    StillRunning(u32),
    /// The sentinel held no usable pid and was cleared.
    ClearedInvalid,
}

/// Keeps at most one instance of each task running.
///
/// Stateless between invocations: everything it knows about previous runs
/// comes from the registry.
#[derive(Debug)]
pub struct Supervisor<R, P> {
    registry: R,
    control: P,
}

impl<R, P> Supervisor<R, P>
where
    R: InstanceRegistry,
    P: ProcessControl,
{
    pub fn new(registry: R, control: P) -> Self {
        Self { registry, control }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn control(&self) -> &P {
        &self.control
    }

    /// Replace any previous instance of `task` (and of the tasks it is
    /// exclusive with) by a freshly started one.
    ///
    /// Termination of previous instances is best effort: missing, stale or
    /// unreadable sentinels and failed `kill`s are logged and skipped. A
    /// failure to start the new process, or to record it, is returned.
    ///
    /// The returned handle is detached; nothing waits for the task.
    pub fn ensure_single_instance(&self, task: &TaskSpec) -> Result<DetachedHandle> {
        let mut notes = self.terminate_previous(task);

        let mut log = match open_log(&task.log, task.log_mode) {
            Ok(log) => log,
            Err(source) => {
                error!(task = %task.name, path = ?task.log, error = %source, "cannot open task log");
                return Err(SupervisorError::Spawn {
                    task: task.name.clone(),
                    source,
                });
            }
        };

        append_notes(&mut log, &task.name, &notes);
        notes.clear();

        let child_log = match log.try_clone() {
            Ok(f) => f,
            Err(source) => {
                return Err(SupervisorError::Spawn {
                    task: task.name.clone(),
                    source,
                });
            }
        };

        let handle = match self.control.spawn_detached(task, child_log) {
            Ok(handle) => handle,
            Err(source) => {
                error!(task = %task.name, cmd = %task.command_line(), error = %source, "failed to start task");
                notes.push(format!("failed to start `{}`: {}", task.command_line(), source));
                append_notes(&mut log, &task.name, &notes);
                return Err(SupervisorError::Spawn {
                    task: task.name.clone(),
                    source,
                });
            }
        };
        let pid = handle.pid();

        if let Err(err) = self.registry.record_instance(&task.name, pid) {
            error!(task = %task.name, pid, error = %err, "task started but could not be recorded");
            notes.push(format!("started pid {pid} but could not record it: {err}"));
            append_notes(&mut log, &task.name, &notes);
            return Err(match err {
                SupervisorError::IoError(source) => SupervisorError::SentinelWrite {
                    task: task.name.clone(),
                    pid,
                    source,
                },
                other => other,
            });
        }

        notes.push(format!("started pid {pid}"));
        append_notes(&mut log, &task.name, &notes);
        info!(task = %task.name, pid, "task instance started");

        Ok(handle)
    }

    /// Send one termination request to every recorded instance `task`
    /// displaces. Returns human-readable notes for the task log.
    fn terminate_previous(&self, task: &TaskSpec) -> Vec<String> {
        let mut notes = Vec::new();
        let mut targets: Vec<(&str, u32)> = Vec::new();

        for name in task.displaced_tasks() {
            match self.registry.last_instance(name) {
                Ok(Some(pid)) => {
                    if targets.iter().all(|(_, seen)| *seen != pid) {
                        targets.push((name, pid));
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(task = %task.name, previous = %name, error = %err, "ignoring unreadable sentinel");
                    notes.push(format!("ignored unreadable sentinel of '{name}': {err}"));
                }
            }
        }

        for (name, pid) in targets {
            match self.control.terminate(pid) {
                Ok(()) => {
                    info!(task = %task.name, previous = %name, pid, "terminated previous instance");
                    notes.push(format!("terminated previous '{name}' instance (pid {pid})"));
                }
                Err(err) => {
                    warn!(task = %task.name, previous = %name, pid, error = %err, "previous instance not terminated; continuing");
                    notes.push(format!("previous '{name}' instance (pid {pid}) not terminated: {err}"));
                }
            }
        }

        notes
    }

    /// What the registry and the OS currently say about `name`.
    pub fn status(&self, name: &str) -> InstanceState {
        match self.registry.last_instance(name) {
            Ok(None) => InstanceState::Absent,
            Ok(Some(pid)) if self.control.is_alive(pid) => InstanceState::Running(pid),
            Ok(Some(pid)) => InstanceState::Stale(pid),
            Err(err) => InstanceState::Invalid(err.to_string()),
        }
    }

    /// Terminate the recorded instance of `name` and poll liveness for up to
    /// `timeout`. The sentinel is cleared once the process is gone.
    ///
    /// Unlike [`ensure_single_instance`](Self::ensure_single_instance),
    /// a failed termination request is returned to the caller.
    pub async fn kill_instance(&self, name: &str, timeout: Duration) -> Result<KillOutcome> {
        let pid = match self.registry.last_instance(name) {
            Ok(Some(pid)) => pid,
            Ok(None) => return Ok(KillOutcome::NotRecorded),
            Err(SupervisorError::InvalidSentinel { path, content }) => {
                warn!(task = %name, path = ?path, content = %content, "clearing invalid sentinel");
                self.registry.clear_instance(name)?;
                return Ok(KillOutcome::ClearedInvalid);
            }
            Err(err) => return Err(err),
        };

        if !self.control.is_alive(pid) {
            self.registry.clear_instance(name)?;
            info!(task = %name, pid, "recorded instance already exited; sentinel cleared");
            return Ok(KillOutcome::AlreadyExited(pid));
        }

        self.control.terminate(pid)?;

        let deadline = Instant::now() + timeout;
        loop {
            if !self.control.is_alive(pid) {
                self.registry.clear_instance(name)?;
                info!(task = %name, pid, "instance exited; sentinel cleared");
                return Ok(KillOutcome::Exited(pid));
            }
            if Instant::now() >= deadline {
                // The record stays so a later `start` can still replace it.
                warn!(task = %name, pid, ?timeout, "instance still running after termination request; sentinel kept");
                return Ok(KillOutcome::StillRunning(pid));
            }
            sleep(LIVENESS_POLL).await;
        }
    }
}

fn open_log(path: &Path, mode: LogMode) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        LogMode::Truncate => options.write(true).truncate(true),
        LogMode::Append => options.append(true),
    };
    options.open(path)
}

/// Supervisor outcome lines go into the task log next to the task's own
/// output. Failing to write them never affects the outcome.
fn append_notes(log: &mut File, task: &str, notes: &[String]) {
    for note in notes {
        if let Err(e) = writeln!(log, "[metarmap] {task}: {note}") {
            warn!(task = %task, error = %e, "could not write to task log");
            return;
        }
    }
}
