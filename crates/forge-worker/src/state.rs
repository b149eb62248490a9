// SPDX-License-Identifier: MIT

/// Per-worker supervisor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Backoff,
    Tripped,
    Stopping,
    Stopped,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Backoff => "backoff",
            SupervisorState::Tripped => "tripped",
            SupervisorState::Stopping => "stopping",
            SupervisorState::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}
