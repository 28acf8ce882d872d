mod common;
use crate::common::{init_tracing, led_map_registry};

use std::error::Error;
use std::fs;
use std::time::Duration;

use metarmap::errors::SupervisorError;
use metarmap::exec::ProcessControl;
use metarmap::registry::{InstanceRegistry, MemoryRegistry, PidFileRegistry};
use metarmap::supervisor::{KillOutcome, Supervisor, TaskSpec};
use metarmap::types::InstanceState;
use metarmap_test_utils::{FakeProcessControl, TaskSpecBuilder};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn refresh(dir: &TempDir) -> TaskSpec {
    TaskSpecBuilder::new("refresh", "metar", dir.path())
        .exclusive_with("lightsoff")
        .build()
}

fn lightsoff(dir: &TempDir) -> TaskSpec {
    TaskSpecBuilder::new("lightsoff", "pixelsoff", dir.path())
        .exclusive_with("refresh")
        .build()
}

#[test]
fn second_start_replaces_first_instance() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(MemoryRegistry::new(), FakeProcessControl::new());
    let task = refresh(&dir);

    let first = sup.ensure_single_instance(&task)?;
    let second = sup.ensure_single_instance(&task)?;

    assert_ne!(first.pid(), second.pid());
    assert_eq!(sup.control().terminated(), vec![first.pid()]);
    assert_eq!(sup.registry().last_instance("refresh")?, Some(second.pid()));
    assert_eq!(sup.registry().names(), vec!["refresh".to_string()]);
    Ok(())
}

#[test]
fn missing_sentinel_means_nothing_to_terminate() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(MemoryRegistry::new(), FakeProcessControl::new());

    let handle = sup.ensure_single_instance(&refresh(&dir))?;

    assert!(sup.control().terminated().is_empty());
    assert_eq!(sup.registry().last_instance("refresh")?, Some(handle.pid()));
    Ok(())
}

#[test]
fn stale_pid_is_ignored_and_new_instance_recorded() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let registry = MemoryRegistry::new();
    registry.record_instance("refresh", 12345)?;
    let sup = Supervisor::new(registry, FakeProcessControl::new());

    let handle = sup.ensure_single_instance(&refresh(&dir))?;

    // The request was made and failed (no such process); startup went on.
    assert_eq!(sup.control().terminated(), vec![12345]);
    assert_eq!(sup.registry().last_instance("refresh")?, Some(handle.pid()));
    Ok(())
}

#[test]
fn refresh_and_lightsoff_exclude_each_other() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(MemoryRegistry::new(), FakeProcessControl::new());

    let off = sup.ensure_single_instance(&lightsoff(&dir))?;
    let on = sup.ensure_single_instance(&refresh(&dir))?;
    assert!(sup.control().terminated().contains(&off.pid()));
    assert!(!sup.control().is_alive(off.pid()));

    let off_again = sup.ensure_single_instance(&lightsoff(&dir))?;
    assert!(sup.control().terminated().contains(&on.pid()));
    assert!(sup.control().is_alive(off_again.pid()));
    Ok(())
}

#[test]
fn tasks_without_exclusion_run_side_by_side() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(MemoryRegistry::new(), FakeProcessControl::new());

    let a = TaskSpecBuilder::new("a", "one", dir.path()).build();
    let b = TaskSpecBuilder::new("b", "two", dir.path()).build();
    sup.ensure_single_instance(&a)?;
    sup.ensure_single_instance(&b)?;

    assert!(sup.control().terminated().is_empty());
    Ok(())
}

#[test]
fn shared_pid_is_signalled_once() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let registry = MemoryRegistry::new();
    registry.record_instance("refresh", 500)?;
    registry.record_instance("lightsoff", 500)?;
    let control = FakeProcessControl::new();
    control.add_alive(500);
    let sup = Supervisor::new(registry, control);

    sup.ensure_single_instance(&refresh(&dir))?;

    assert_eq!(sup.control().terminated(), vec![500]);
    Ok(())
}

#[test]
fn spawn_failure_keeps_previous_sentinel() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let registry = led_map_registry(dir.path());
    fs::write(dir.path().join("metarpid.pid"), "777\n")?;

    let control = FakeProcessControl::new();
    control.fail_spawning("metar");
    let sup = Supervisor::new(registry, control);

    let result = sup.ensure_single_instance(&refresh(&dir));

    match result {
        Err(SupervisorError::Spawn { task, .. }) => assert_eq!(task, "refresh"),
        Err(e) => panic!("Expected Spawn error, got: {:?}", e),
        Ok(h) => panic!("Expected error, got handle for pid {}", h.pid()),
    }
    assert_eq!(fs::read_to_string(dir.path().join("metarpid.pid"))?, "777\n");

    let log = fs::read_to_string(dir.path().join("refresh.log"))?;
    assert!(log.contains("failed to start `metar`"), "log was: {log}");
    Ok(())
}

#[test]
fn scenario_stale_metar_sentinel() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    fs::write(dir.path().join("metarpid.pid"), "12345\n")?;
    let sup = Supervisor::new(
        led_map_registry(dir.path()),
        FakeProcessControl::starting_at(23456),
    );

    let handle = sup.ensure_single_instance(&refresh(&dir))?;

    assert_eq!(handle.pid(), 23456);
    assert_eq!(fs::read_to_string(dir.path().join("metarpid.pid"))?, "23456\n");
    assert!(!dir.path().join("offpid.pid").exists());
    Ok(())
}

#[test]
fn malformed_sentinel_does_not_block_start() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    fs::write(dir.path().join("metarpid.pid"), "not a pid")?;
    let sup = Supervisor::new(led_map_registry(dir.path()), FakeProcessControl::new());

    let handle = sup.ensure_single_instance(&refresh(&dir))?;

    assert!(sup.control().terminated().is_empty());
    assert_eq!(sup.registry().last_instance("refresh")?, Some(handle.pid()));

    let log = fs::read_to_string(dir.path().join("refresh.log"))?;
    assert!(log.contains("ignored unreadable sentinel"), "log was: {log}");
    Ok(())
}

#[test]
fn outcomes_are_written_to_task_log() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(MemoryRegistry::new(), FakeProcessControl::new());

    let first = sup.ensure_single_instance(&refresh(&dir))?;
    let second = sup.ensure_single_instance(&refresh(&dir))?;

    let log = fs::read_to_string(dir.path().join("refresh.log"))?;
    assert!(log.contains(&format!("[metarmap] refresh: started pid {}", first.pid())));
    assert!(log.contains(&format!(
        "terminated previous 'refresh' instance (pid {})",
        first.pid()
    )));
    assert!(log.contains(&format!("started pid {}", second.pid())));
    Ok(())
}

#[test]
fn status_reports_each_state() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(led_map_registry(dir.path()), FakeProcessControl::new());

    assert_eq!(sup.status("refresh"), InstanceState::Absent);

    let handle = sup.ensure_single_instance(&refresh(&dir))?;
    assert_eq!(sup.status("refresh"), InstanceState::Running(handle.pid()));

    sup.control().exit(handle.pid());
    assert_eq!(sup.status("refresh"), InstanceState::Stale(handle.pid()));

    fs::write(dir.path().join("offpid.pid"), "garbage")?;
    assert!(matches!(sup.status("lightsoff"), InstanceState::Invalid(_)));
    Ok(())
}

#[tokio::test]
async fn kill_terminates_and_clears() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(led_map_registry(dir.path()), FakeProcessControl::new());
    let handle = sup.ensure_single_instance(&refresh(&dir))?;

    let outcome = sup.kill_instance("refresh", Duration::from_secs(1)).await?;

    assert_eq!(outcome, KillOutcome::Exited(handle.pid()));
    assert!(!dir.path().join("metarpid.pid").exists());
    assert_eq!(sup.kill_instance("refresh", Duration::from_secs(1)).await?, KillOutcome::NotRecorded);
    Ok(())
}

#[tokio::test]
async fn kill_clears_stale_and_invalid_sentinels() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(led_map_registry(dir.path()), FakeProcessControl::new());

    fs::write(dir.path().join("metarpid.pid"), "12345\n")?;
    assert_eq!(
        sup.kill_instance("refresh", Duration::from_secs(1)).await?,
        KillOutcome::AlreadyExited(12345)
    );
    assert!(sup.control().terminated().is_empty());

    fs::write(dir.path().join("offpid.pid"), "x")?;
    assert_eq!(
        sup.kill_instance("lightsoff", Duration::from_secs(1)).await?,
        KillOutcome::ClearedInvalid
    );
    assert!(!dir.path().join("offpid.pid").exists());
    Ok(())
}

#[tokio::test]
async fn kill_keeps_sentinel_while_instance_survives() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let sup = Supervisor::new(led_map_registry(dir.path()), FakeProcessControl::new());
    let handle = sup.ensure_single_instance(&refresh(&dir))?;
    sup.control().ignore_termination(handle.pid());

    let outcome = sup.kill_instance("refresh", Duration::from_millis(120)).await?;

    assert_eq!(outcome, KillOutcome::StillRunning(handle.pid()));
    assert_eq!(sup.control().terminated(), vec![handle.pid()]);
    assert_eq!(sup.registry().last_instance("refresh")?, Some(handle.pid()));

    // A later start can still find and replace it.
    let next = sup.ensure_single_instance(&refresh(&dir))?;
    assert_eq!(sup.control().terminated(), vec![handle.pid(), handle.pid()]);
    assert_eq!(sup.registry().last_instance("refresh")?, Some(next.pid()));
    Ok(())
}

#[test]
fn unrecordable_instance_is_a_sentinel_write_error() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let blocker = dir.path().join("not-a-directory");
    fs::write(&blocker, "")?;
    let sup = Supervisor::new(
        PidFileRegistry::new(&blocker),
        FakeProcessControl::starting_at(31000),
    );

    let result = sup.ensure_single_instance(&refresh(&dir));

    match result {
        Err(SupervisorError::SentinelWrite { task, pid, .. }) => {
            assert_eq!(task, "refresh");
            assert_eq!(pid, 31000);
        }
        Err(e) => panic!("Expected SentinelWrite error, got: {:?}", e),
        Ok(h) => panic!("Expected error, got handle for pid {}", h.pid()),
    }
    assert_eq!(sup.control().spawned(), vec![("refresh".to_string(), 31000)]);

    let log = fs::read_to_string(dir.path().join("refresh.log"))?;
    assert!(log.contains("started pid 31000 but could not record it"), "log was: {log}");
    Ok(())
}
