// src/supervisor/task.rs

use std::path::PathBuf;

use crate::types::LogMode;

/// A fully resolved task, ready to be supervised.
///
/// Built from a validated config via `ConfigFile::task_spec`; all paths are
/// absolute or relative to the process's current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    pub cmd: String,
    pub args: Vec<String>,
    pub shell: bool,
    pub workdir: PathBuf,
    pub log: PathBuf,
    pub log_mode: LogMode,
    /// Tasks whose recorded instances are terminated before this one starts.
    pub exclusive_with: Vec<String>,
}

impl TaskSpec {
    /// `cmd` followed by `args`, space separated. This is what `sh -c`
    /// receives for shell tasks.
    pub fn command_line(&self) -> String {
        let mut line = self.cmd.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Every task whose recorded instance must be gone before this one
    /// starts: the task itself first, then its exclusion set.
    pub fn displaced_tasks(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.exclusive_with.iter().map(|s| s.as_str()))
    }
}
