// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod supervisor;
pub mod types;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::ConfigFile;
use crate::config::loader::load_or_builtin;
use crate::exec::RealProcessControl;
use crate::registry::PidFileRegistry;
use crate::supervisor::{KillOutcome, Supervisor};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file or built-in tasks)
/// - the PID-file registry rooted at the configured workdir
/// - the OS process control
/// - the requested subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_builtin(&args.config)
        .with_context(|| format!("loading config from {:?}", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("no command given (expected `start`, `status` or `kill`; see --help)");
    };

    let supervisor = supervisor_for(&cfg);

    match command {
        Command::Start { task } => {
            let spec = cfg.task_spec(&task)?;
            let handle = supervisor
                .ensure_single_instance(&spec)
                .with_context(|| format!("starting task '{task}'"))?;
            println!("{}: started pid {}", handle.task(), handle.pid());
        }
        Command::Status { task } => {
            let names: Vec<String> = match task {
                Some(name) => {
                    cfg.task_spec(&name)?;
                    vec![name]
                }
                None => cfg.task.keys().cloned().collect(),
            };
            for name in names {
                println!("{name}: {}", supervisor.status(&name));
            }
        }
        Command::Kill { task, timeout } => {
            cfg.task_spec(&task)?;
            let outcome = supervisor
                .kill_instance(&task, timeout)
                .await
                .with_context(|| format!("killing task '{task}'"))?;
            match outcome {
                KillOutcome::NotRecorded => println!("{task}: not started"),
                KillOutcome::AlreadyExited(pid) => {
                    println!("{task}: pid {pid} had already exited; sentinel cleared")
                }
                KillOutcome::Exited(pid) => println!("{task}: pid {pid} terminated"),
                KillOutcome::ClearedInvalid => println!("{task}: invalid sentinel cleared"),
                KillOutcome::StillRunning(pid) => {
                    bail!("{task}: pid {pid} still running after {timeout:?}")
                }
            }
        }
    }

    Ok(())
}

/// Production supervisor for a validated config.
pub fn supervisor_for(cfg: &ConfigFile) -> Supervisor<PidFileRegistry, RealProcessControl> {
    let registry = PidFileRegistry::with_files(cfg.workdir(), cfg.pid_files());
    Supervisor::new(registry, RealProcessControl)
}

/// Simple dry-run output: print tasks, sentinels and exclusions.
fn print_dry_run(cfg: &ConfigFile) {
    let registry = PidFileRegistry::with_files(cfg.workdir(), cfg.pid_files());

    println!("metarmap dry-run");
    println!("  workdir = {}", cfg.workdir().display());
    println!();

    println!("tasks ({}):", cfg.task.len());
    for name in cfg.task.keys() {
        let Ok(spec) = cfg.task_spec(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      cmd: {}", spec.command_line());
        if spec.shell {
            println!("      shell: true");
        }
        println!("      workdir: {}", spec.workdir.display());
        println!("      log: {} ({:?})", spec.log.display(), spec.log_mode);
        println!("      sentinel: {}", registry.sentinel_path(name).display());
        if !spec.exclusive_with.is_empty() {
            println!("      exclusive_with: {:?}", spec.exclusive_with);
        }
    }

    debug!("dry-run complete (nothing started)");
}
