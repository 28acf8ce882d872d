// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// The sentinel exists but does not hold a usable process identifier.
    #[error("invalid sentinel {path:?}: {content:?} is not a process id")]
    InvalidSentinel { path: PathBuf, content: String },

    /// The task command could not be started; no sentinel was written.
    #[error("failed to spawn task '{task}': {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    /// The task is running but its pid could not be recorded.
    #[error("task '{task}' started as pid {pid} but its sentinel could not be written: {source}")]
    SentinelWrite {
        task: String,
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to terminate pid {pid}: {source}")]
    Terminate {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;
