// src/config/mod.rs

//! Configuration loading and validation for metarmap.
//!
//! - `model.rs`: the TOML-backed data model and task resolution.
//! - `loader.rs`: reading a config file, or falling back to the built-in
//!   LED map tasks.
//! - `validate.rs`: task references, sentinel uniqueness and the exclusion
//!   relation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_builtin};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
