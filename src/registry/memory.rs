// src/registry/memory.rs

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use super::InstanceRegistry;
use crate::errors::{Result, SupervisorError};

/// Keeps instance records in memory only (lost on exit).
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    pids: Mutex<HashMap<String, u32>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names with a record, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.pids.lock() {
            Ok(pids) => pids.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }

    fn with_pids<T>(&self, f: impl FnOnce(&mut HashMap<String, u32>) -> T) -> Result<T> {
        let mut pids = self
            .pids
            .lock()
            .map_err(|_| SupervisorError::Other(anyhow::anyhow!("registry lock poisoned")))?;
        Ok(f(&mut pids))
    }
}

impl InstanceRegistry for MemoryRegistry {
    fn record_instance(&self, name: &str, pid: u32) -> Result<()> {
        self.with_pids(|pids| pids.insert(name.to_string(), pid))?;
        debug!(task = %name, pid, "recorded instance (memory)");
        Ok(())
    }

    fn last_instance(&self, name: &str) -> Result<Option<u32>> {
        self.with_pids(|pids| pids.get(name).copied())
    }

    fn clear_instance(&self, name: &str) -> Result<()> {
        self.with_pids(|pids| pids.remove(name))?;
        Ok(())
    }
}
