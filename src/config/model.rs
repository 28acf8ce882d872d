// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{Result, SupervisorError};
use crate::supervisor::TaskSpec;
use crate::types::LogMode;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// workdir = "/home/pi"
///
/// [task.refresh]
/// cmd = ".venv/bin/python3"
/// args = ["metar.py"]
/// log = "metar.log"
/// log_mode = "truncate"
/// pid_file = "metarpid.pid"
/// exclusive_with = ["lightsoff"]
///
/// [task.lightsoff]
/// cmd = ".venv/bin/python3"
/// args = ["pixelsoff.py"]
/// log = "lightsoff.log"
/// pid_file = "offpid.pid"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Directory holding the sentinel files, and the default working
    /// directory of every task.
    ///
    /// Relative paths are resolved against the directory containing the
    /// config file. If unset, that directory itself is used.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Program to execute (or the shell snippet when `shell = true`).
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Run `cmd` and `args` through `sh -c` instead of executing directly.
    ///
    /// With a shell, a missing program only shows up in the log; executed
    /// directly it fails the start.
    #[serde(default)]
    pub shell: bool,

    /// Task-local working directory; falls back to `[config].workdir`.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Log file for combined stdout/stderr. Defaults to `<name>.log`.
    #[serde(default)]
    pub log: Option<PathBuf>,

    #[serde(default)]
    pub log_mode: LogMode,

    /// Sentinel file name, relative to `[config].workdir`. Defaults to
    /// `<name>.pid`.
    #[serde(default)]
    pub pid_file: Option<PathBuf>,

    /// Tasks that are killed before this one starts (and vice versa).
    #[serde(default)]
    pub exclusive_with: Vec<String>,
}

impl TaskConfig {
    pub fn effective_pid_file(&self, name: &str) -> PathBuf {
        self.pid_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{name}.pid")))
    }

    pub fn effective_log(&self, name: &str) -> PathBuf {
        self.log
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{name}.log")))
    }
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so every `exclusive_with` entry is known to name an existing task.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
    base_dir: PathBuf,
    exclusions: BTreeMap<String, Vec<String>>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        exclusions: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            config,
            task,
            base_dir: PathBuf::from("."),
            exclusions,
        }
    }

    /// Anchor relative paths at `dir` (normally the config file's directory).
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// The LED map deployment: a truncating `refresh` task and an appending
    /// `lightsoff` task, mutually exclusive.
    pub fn builtin() -> Result<Self> {
        let python = ".venv/bin/python3".to_string();

        let mut task = BTreeMap::new();
        task.insert(
            "refresh".to_string(),
            TaskConfig {
                cmd: python.clone(),
                args: vec!["metar.py".to_string()],
                shell: false,
                workdir: None,
                log: Some(PathBuf::from("metar.log")),
                log_mode: LogMode::Truncate,
                pid_file: Some(PathBuf::from("metarpid.pid")),
                exclusive_with: vec!["lightsoff".to_string()],
            },
        );
        task.insert(
            "lightsoff".to_string(),
            TaskConfig {
                cmd: python,
                args: vec!["pixelsoff.py".to_string()],
                shell: false,
                workdir: None,
                log: Some(PathBuf::from("lightsoff.log")),
                log_mode: LogMode::Append,
                pid_file: Some(PathBuf::from("offpid.pid")),
                exclusive_with: vec![],
            },
        );

        let raw = RawConfigFile {
            config: ConfigSection::default(),
            task,
        };

        ConfigFile::try_from(raw)
    }

    /// Directory holding the sentinel files.
    pub fn workdir(&self) -> PathBuf {
        match &self.config.workdir {
            Some(dir) => resolve(&self.base_dir, dir),
            None => self.base_dir.clone(),
        }
    }

    /// Sentinel file name for every task, keyed by task name.
    pub fn pid_files(&self) -> BTreeMap<String, PathBuf> {
        self.task
            .iter()
            .map(|(name, task)| (name.clone(), task.effective_pid_file(name)))
            .collect()
    }

    /// Tasks that are terminated whenever `name` starts. Always excludes
    /// `name` itself and is symmetric.
    pub fn exclusion_set(&self, name: &str) -> &[String] {
        self.exclusions
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a task definition into everything the supervisor needs.
    pub fn task_spec(&self, name: &str) -> Result<TaskSpec> {
        let task = self
            .task
            .get(name)
            .ok_or_else(|| SupervisorError::TaskNotFound(name.to_string()))?;

        let root = self.workdir();
        let workdir = match &task.workdir {
            Some(dir) => resolve(&root, dir),
            None => root,
        };
        let log = resolve(&workdir, &task.effective_log(name));

        // `.venv/bin/python3` means relative to the task's workdir, not to
        // wherever cron happened to start us.
        let cmd = if !task.shell && task.cmd.contains('/') {
            resolve(&workdir, Path::new(&task.cmd))
                .to_string_lossy()
                .into_owned()
        } else {
            task.cmd.clone()
        };

        Ok(TaskSpec {
            name: name.to_string(),
            cmd,
            args: task.args.clone(),
            shell: task.shell,
            workdir,
            log,
            log_mode: task.log_mode,
            exclusive_with: self.exclusion_set(name).to_vec(),
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
