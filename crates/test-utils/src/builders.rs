#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use metarmap::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use metarmap::supervisor::TaskSpec;
use metarmap::types::LogMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    base_dir: Option<PathBuf>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
            base_dir: None,
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_workdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.config.workdir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        let base_dir = self.base_dir.clone();
        let cfg =
            ConfigFile::try_from(self.config).expect("Failed to build valid config from builder");
        match base_dir {
            Some(dir) => cfg.with_base_dir(dir),
            None => cfg,
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                args: vec![],
                shell: false,
                workdir: None,
                log: None,
                log_mode: LogMode::Append,
                pid_file: None,
                exclusive_with: vec![],
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.task.args.push(arg.to_string());
        self
    }

    pub fn shell(mut self, val: bool) -> Self {
        self.task.shell = val;
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.task.workdir = Some(PathBuf::from(dir));
        self
    }

    pub fn log(mut self, path: &str) -> Self {
        self.task.log = Some(PathBuf::from(path));
        self
    }

    pub fn log_mode(mut self, mode: LogMode) -> Self {
        self.task.log_mode = mode;
        self
    }

    pub fn pid_file(mut self, file: &str) -> Self {
        self.task.pid_file = Some(PathBuf::from(file));
        self
    }

    pub fn exclusive_with(mut self, other: &str) -> Self {
        self.task.exclusive_with.push(other.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for a resolved `TaskSpec`, for tests that bypass config files.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    /// A task named `name` running `cmd` in `dir`, logging to
    /// `<dir>/<name>.log` in append mode.
    pub fn new(name: &str, cmd: &str, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            spec: TaskSpec {
                name: name.to_string(),
                cmd: cmd.to_string(),
                args: vec![],
                shell: false,
                workdir: dir.to_path_buf(),
                log: dir.join(format!("{name}.log")),
                log_mode: LogMode::Append,
                exclusive_with: vec![],
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.spec.args.push(arg.to_string());
        self
    }

    pub fn shell(mut self, val: bool) -> Self {
        self.spec.shell = val;
        self
    }

    pub fn log_mode(mut self, mode: LogMode) -> Self {
        self.spec.log_mode = mode;
        self
    }

    pub fn exclusive_with(mut self, other: &str) -> Self {
        self.spec.exclusive_with.push(other.to_string());
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}
