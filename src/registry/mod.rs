// src/registry/mod.rs

//! Task name -> last known process id.
//!
//! The supervisor only talks to [`InstanceRegistry`], so the storage can
//! change (locking, a different on-disk layout) without touching callers.
//!
//! - [`pid_file`] stores one sentinel file per task (production).
//! - [`memory`] keeps records in memory (tests, dry runs).

pub mod memory;
pub mod pid_file;

use crate::errors::Result;

pub use memory::MemoryRegistry;
pub use pid_file::PidFileRegistry;

/// Abstract storage for the most recently started instance of each task.
pub trait InstanceRegistry: Send + Sync + std::fmt::Debug {
    /// Record `pid` as the live instance of `name`, replacing any previous
    /// record.
    fn record_instance(&self, name: &str, pid: u32) -> Result<()>;

    /// Last recorded pid for `name`, or `None` if nothing is recorded.
    ///
    /// A record that exists but does not hold a usable pid is reported as
    /// `SupervisorError::InvalidSentinel`.
    fn last_instance(&self, name: &str) -> Result<Option<u32>>;

    /// Forget the record for `name`. Clearing a missing record succeeds.
    fn clear_instance(&self, name: &str) -> Result<()>;
}
