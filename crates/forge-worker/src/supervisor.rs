// SPDX-License-Identifier: MIT

//! The per-worker supervisor task: panic recovery, exponential backoff, and
//! circuit breaking.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use forge_core::panic::{install_hook, panic_message, take_backtrace};
use crate::policy::WorkerPolicy;
use crate::state::SupervisorState;
use crate::worker::Worker;

/// A sliding window of recent failure timestamps backing the circuit breaker.
struct FailureWindow {
    window: Duration,
    failures: VecDeque<Instant>,
}

impl FailureWindow {
    fn new(window: Duration) -> Self {
        FailureWindow { window, failures: VecDeque::new() }
    }

    /// Records a failure now and prunes entries older than the window,
    /// returning the count still inside it.
    fn record(&mut self) -> u32 {
        let now = Instant::now();
        self.failures.push_back(now);
        while let Some(&front) = self.failures.front() {
            if now.duration_since(front) > self.window {
                self.failures.pop_front();
            } else {
                break;
            }
        }
        self.failures.len() as u32
    }
}

/// Handle external callers use to observe (never mutate) a worker's state.
#[derive(Clone)]
pub struct WorkerHandle {
    pub(crate) name: String,
    pub(crate) critical: bool,
    pub(crate) state: Arc<Mutex<SupervisorState>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock()
    }
}

/// Runs the full supervision loop for one worker instance until shutdown is
/// observed or the circuit breaker trips. Intended to be spawned as its own
/// task by [`crate::manager::WorkerManager`].
pub(crate) async fn supervise(
    name: String,
    critical: bool,
    worker: Arc<dyn Worker>,
    policy: WorkerPolicy,
    shutdown: CancellationToken,
    state: Arc<Mutex<SupervisorState>>,
    on_critical_trip: Arc<dyn Fn(String) + Send + Sync>,
) {
    install_hook();
    let mut window = FailureWindow::new(policy.circuit_window);
    let mut attempt: u32 = 0;

    *state.lock() = SupervisorState::Starting;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        *state.lock() = SupervisorState::Running;
        let started_at = Instant::now();

        let outcome = AssertUnwindSafe(worker.run(shutdown.clone())).catch_unwind().await;

        if shutdown.is_cancelled() {
            break;
        }

        let ran_stably = started_at.elapsed() >= policy.stable_run_period;
        if ran_stably {
            attempt = 0;
        }

        let failed = match outcome {
            Ok(Ok(())) if !policy.restart_on_clean_exit => {
                info!(worker = %name, "clean exit, not restarting");
                *state.lock() = SupervisorState::Stopped;
                return;
            }
            Ok(Ok(())) => {
                info!(worker = %name, "clean exit, restarting per policy");
                true
            }
            Ok(Err(source)) => {
                warn!(worker = %name, error = %source, "worker returned an error");
                true
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                let backtrace = take_backtrace();
                error!(worker = %name, panic = %message, backtrace = %backtrace, "worker panicked");
                true
            }
        };

        if !failed {
            continue;
        }

        let failures_in_window = window.record();
        if failures_in_window >= policy.max_restarts {
            *state.lock() = SupervisorState::Tripped;
            error!(worker = %name, failures = failures_in_window, "circuit breaker tripped");
            if critical {
                on_critical_trip(name.clone());
            }
            return;
        }

        *state.lock() = SupervisorState::Backoff;
        let sleep = policy.backoff.interval(attempt);
        attempt += 1;
        tokio::select! {
            _ = tokio::time::sleep(sleep) => {}
            _ = shutdown.cancelled() => break,
        }
    }

    *state.lock() = SupervisorState::Stopping;
    *state.lock() = SupervisorState::Stopped;
}
