// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Fraction of the computed interval to randomize by, e.g. `0.2` spreads
    /// the sleep across `interval * [0.8, 1.2)`.
    pub randomization_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            initial_interval: Duration::from_millis(500),
            multiplier: 2.0,
            max_interval: Duration::from_secs(60),
            randomization_factor: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Computed sleep for the n-th (0-based) consecutive failure, with jitter.
    pub(crate) fn interval(&self, attempt: u32) -> Duration {
        let raw = self.initial_interval.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_interval.as_secs_f64());

        let jitter = if self.randomization_factor > 0.0 {
            let spread = capped * self.randomization_factor;
            rand::random::<f64>() * (2.0 * spread) - spread
        } else {
            0.0
        };

        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

/// Per-worker supervision policy.
#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    /// Failures allowed inside `circuit_window` before the breaker trips.
    pub max_restarts: u32,
    pub circuit_window: Duration,
    /// How long a worker must stay `running` before its backoff schedule
    /// resets to `backoff.initial_interval`.
    pub stable_run_period: Duration,
    pub hook_timeout: Duration,
    pub backoff: BackoffPolicy,
    /// A clean (non-panicking) return with no shutdown pending is, by
    /// default, NOT restarted; set this to opt back into restarting workers
    /// that are meant to loop forever.
    pub restart_on_clean_exit: bool,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        WorkerPolicy {
            max_restarts: 5,
            circuit_window: Duration::from_secs(60),
            stable_run_period: Duration::from_secs(60),
            hook_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            restart_on_clean_exit: false,
        }
    }
}
