#![allow(dead_code)]

use std::path::Path;

use metarmap::registry::PidFileRegistry;

pub use metarmap_test_utils::init_tracing;

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Registry using the sentinel names of the LED map deployment.
pub fn led_map_registry(dir: &Path) -> PidFileRegistry {
    let mut files = std::collections::BTreeMap::new();
    files.insert("refresh".to_string(), "metarpid.pid".into());
    files.insert("lightsoff".to_string(), "offpid.pid".into());
    PidFileRegistry::with_files(dir, files)
}

/// A pid that belonged to a process which has already exited and been
/// reaped, so signalling it cannot hit anything we own.
pub fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawning `true`");
    let pid = child.id();
    child.wait().expect("waiting for `true`");
    pid
}
