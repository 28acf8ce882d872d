// src/exec/command.rs

use std::fs::File;
use std::io;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::exec::DetachedHandle;
use crate::supervisor::TaskSpec;

/// Start `task` in its own session with stdout and stderr both going to
/// `log`, and return without waiting for it.
///
/// A program that cannot be executed (missing, not executable, bad working
/// directory) is reported here as an error.
pub fn spawn_detached(task: &TaskSpec, log: File) -> io::Result<DetachedHandle> {
    let mut cmd = build_command(task);

    let stderr_log = log.try_clone()?;
    cmd.current_dir(&task.workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr_log))
        .kill_on_drop(false);

    // SAFETY: `setsid` is async-signal-safe and touches no parent state.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn()?;
    let pid = child.id().ok_or_else(|| {
        io::Error::other("spawned process exited before its pid could be read")
    })?;

    info!(task = %task.name, pid, cmd = %task.command_line(), "started detached task process");

    Ok(DetachedHandle::new(task.name.clone(), pid, child))
}

fn build_command(task: &TaskSpec) -> Command {
    if task.shell {
        let mut c = Command::new("sh");
        c.arg("-c").arg(task.command_line());
        c
    } else {
        let mut c = Command::new(&task.cmd);
        c.args(&task.args);
        c
    }
}
