use serde::Deserialize;

/// What happens to a task's log file when a new instance starts.
///
/// - `Truncate`: the log only ever holds the output of the current instance
///   (the refresh task).
/// - `Append`: output accumulates across starts (the lights-off task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    Truncate,
    #[default]
    Append,
}

/// Observed state of a task's recorded instance, as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    /// No sentinel: never started, or explicitly cleared.
    Absent,
    /// Sentinel present and the process answers a liveness probe.
    Running(u32),
    /// Sentinel present but the process is gone.
    Stale(u32),
    /// Sentinel present but unreadable as a pid.
    Invalid(String),
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceState::Absent => write!(f, "not started"),
            InstanceState::Running(pid) => write!(f, "running (pid {pid})"),
            InstanceState::Stale(pid) => write!(f, "stale (pid {pid} not running)"),
            InstanceState::Invalid(reason) => write!(f, "invalid sentinel ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mode_defaults_to_append() {
        assert_eq!(LogMode::default(), LogMode::Append);
    }

    #[test]
    fn instance_state_display() {
        assert_eq!(InstanceState::Running(42).to_string(), "running (pid 42)");
        assert_eq!(InstanceState::Absent.to_string(), "not started");
    }
}
