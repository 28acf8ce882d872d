// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `metarmap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "metarmap",
    version,
    about = "Start, replace and stop the LED weather map processes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Metarmap.toml` in the current working directory. If that
    /// file does not exist, the built-in `refresh`/`lightsoff` tasks are
    /// used, rooted at the current directory.
    #[arg(long, value_name = "PATH", default_value = "Metarmap.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `METARMAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved tasks, but don't start or
    /// signal anything.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start a task, replacing its previous instance and any instance of a
    /// task it is exclusive with.
    Start {
        /// Task name from the config (e.g. `refresh`, `lightsoff`).
        task: String,
    },

    /// Show the recorded instance of each task (or just one).
    Status {
        task: Option<String>,
    },

    /// Terminate a task's recorded instance and clear its sentinel.
    Kill {
        task: String,

        /// How long to wait for the process to exit, e.g. `5s`, `500ms`.
        #[arg(long, value_name = "DURATION", default_value = "5s", value_parser = parse_duration)]
        timeout: Duration,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{}' is too large", s)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s or m",
            unit
        )),
    }
}
