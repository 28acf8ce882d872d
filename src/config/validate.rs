// src/config/validate.rs

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use petgraph::graphmap::UnGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let exclusions = exclusion_sets(&raw);
        Ok(ConfigFile::new_unchecked(raw.config, raw.task, exclusions))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_commands(cfg)?;
    validate_exclusions(cfg)?;
    validate_pid_files(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SupervisorError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(SupervisorError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_exclusions(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for other in task.exclusive_with.iter() {
            if !cfg.task.contains_key(other) {
                return Err(SupervisorError::ConfigError(format!(
                    "task '{}' has unknown task '{}' in `exclusive_with`",
                    name, other
                )));
            }
            if other == name {
                return Err(SupervisorError::ConfigError(format!(
                    "task '{}' cannot list itself in `exclusive_with` (a task always replaces its own previous instance)",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Two tasks writing the same sentinel would terminate each other's
/// instances through a shared record, which `exclusive_with` already
/// expresses explicitly.
fn validate_pid_files(cfg: &RawConfigFile) -> Result<()> {
    let root = cfg.config.workdir.clone().unwrap_or_default();
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for (name, task) in cfg.task.iter() {
        let pid_file = task.effective_pid_file(name);
        if let Some(previous) = seen.insert(normalise(&root.join(&pid_file)), name.as_str()) {
            return Err(SupervisorError::ConfigError(format!(
                "tasks '{}' and '{}' share the sentinel file {:?}",
                previous, name, pid_file
            )));
        }
    }
    Ok(())
}

/// Drop `.` components so `offpid.pid` and `./offpid.pid` compare equal.
fn normalise(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Build the undirected exclusion relation and return each task's
/// neighbours.
///
/// Edge direction does not matter: `refresh.exclusive_with = ["lightsoff"]`
/// means starting either one terminates the other.
fn exclusion_sets(cfg: &RawConfigFile) -> BTreeMap<String, Vec<String>> {
    let mut graph: UnGraphMap<&str, ()> = UnGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for other in task.exclusive_with.iter() {
            graph.add_edge(name.as_str(), other.as_str(), ());
        }
    }

    cfg.task
        .keys()
        .map(|name| {
            let mut neighbours: Vec<String> = graph
                .neighbors(name.as_str())
                .filter(|other| *other != name.as_str())
                .map(|s| s.to_string())
                .collect();
            neighbours.sort();
            neighbours.dedup();
            (name.clone(), neighbours)
        })
        .collect()
}
