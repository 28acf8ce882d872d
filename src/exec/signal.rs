// src/exec/signal.rs

//! Thin wrappers over `kill(2)`.

use std::io;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::errors::{Result, SupervisorError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Convert a recorded pid into something safe to signal.
///
/// `kill(0, ..)` and `kill(-1, ..)` address whole process groups or every
/// process we may signal, so a corrupt record must never reach them. We
/// also refuse to signal init or ourselves.
fn target(pid: u32) -> io::Result<libc::pid_t> {
    let raw = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    if raw <= 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to signal pid 0 or 1",
        ));
    }
    if pid == std::process::id() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to signal the supervisor itself",
        ));
    }
    // A reused pid can be the leader of the group we run in (cron's `sh -c`).
    // SAFETY: `getpgrp` cannot fail and touches no memory.
    if raw == unsafe { libc::getpgrp() } {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to signal the supervisor's own process group",
        ));
    }
    Ok(raw)
}

/// Whether `raw` leads its own process group, as the tasks we spawn do.
fn leads_group(raw: libc::pid_t) -> bool {
    // SAFETY: `getpgid` has no memory-safety preconditions.
    unsafe { libc::getpgid(raw) == raw }
}

/// Send a single SIGTERM to `pid`.
///
/// Tasks are spawned as session leaders, so when `pid` still leads its
/// group the signal goes to the whole group (this also reaches a `sh -c`
/// child). Otherwise the pid alone is signalled.
pub fn terminate(pid: u32) -> Result<()> {
    let raw = target(pid).map_err(|source| SupervisorError::Terminate { pid, source })?;

    // SAFETY: `kill` has no memory-safety preconditions; `raw` is > 1 and
    // not our own group.
    if leads_group(raw) && unsafe { libc::kill(-raw, libc::SIGTERM) } == 0 {
        debug!(pid, "sent SIGTERM to process group");
        return Ok(());
    }

    // SAFETY: as above.
    if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
        debug!(pid, "sent SIGTERM to process");
        return Ok(());
    }

    Err(SupervisorError::Terminate {
        pid,
        source: io::Error::last_os_error(),
    })
}

/// Signal-0 liveness probe.
///
/// `EPERM` means the process exists but belongs to someone else, which
/// still counts as alive. An unreaped zombie also counts as alive.
pub fn is_alive(pid: u32) -> bool {
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    // SAFETY: signal 0 performs only the existence/permission check.
    if unsafe { libc::kill(raw, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Poll [`is_alive`] until the process is gone or `timeout` elapses.
///
/// Returns `true` if the process exited in time.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}
