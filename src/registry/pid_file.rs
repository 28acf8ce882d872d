// src/registry/pid_file.rs

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::InstanceRegistry;
use crate::errors::{Result, SupervisorError};

/// Stores each task's pid in its own sentinel file under one directory.
///
/// The on-disk format is a single decimal pid followed by a newline, which
/// is what `kill $(cat metarpid.pid)` style scripts expect.
#[derive(Debug, Clone)]
pub struct PidFileRegistry {
    dir: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl PidFileRegistry {
    /// Registry rooted at `dir` where every task uses `<name>.pid`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Registry rooted at `dir` with explicit sentinel names for some tasks.
    /// Tasks not in `files` still use `<name>.pid`.
    pub fn with_files(dir: impl Into<PathBuf>, files: BTreeMap<String, PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    /// Full path of the sentinel file for `name`.
    pub fn sentinel_path(&self, name: &str) -> PathBuf {
        match self.files.get(name) {
            Some(file) => self.dir.join(file),
            None => self.dir.join(format!("{name}.pid")),
        }
    }
}

impl InstanceRegistry for PidFileRegistry {
    fn record_instance(&self, name: &str, pid: u32) -> Result<()> {
        let path = self.sentinel_path(name);
        write_atomically(&path, format!("{pid}\n").as_bytes())?;
        info!(task = %name, pid, path = ?path, "recorded instance");
        Ok(())
    }

    fn last_instance(&self, name: &str) -> Result<Option<u32>> {
        let path = self.sentinel_path(name);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(task = %name, path = ?path, "no sentinel");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        parse_pid(&contents)
            .map(Some)
            .ok_or_else(|| SupervisorError::InvalidSentinel {
                path,
                content: contents.trim().to_string(),
            })
    }

    fn clear_instance(&self, name: &str) -> Result<()> {
        let path = self.sentinel_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(task = %name, path = ?path, "cleared sentinel");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A positive decimal pid, surrounding whitespace allowed.
fn parse_pid(contents: &str) -> Option<u32> {
    match contents.trim().parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(pid) => Some(pid),
    }
}

/// Write to a uniquely named temp file in the same directory and persist it
/// over `path`, so readers never see a partially written pid and
/// overlapping writers never share a temp file.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
