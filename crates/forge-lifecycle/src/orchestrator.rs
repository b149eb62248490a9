// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use forge_core::{Container, HookContext, Key};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};

use crate::blame::BlameRecord;
use crate::error::{Error, Result};

/// Function invoked when the global shutdown budget is exceeded. Defaults to
/// a nonzero process exit; tests inject a recording stub instead.
pub type TerminateFn = Arc<dyn Fn(i32) + Send + Sync>;

pub fn default_terminate() -> TerminateFn {
    Arc::new(|code| std::process::exit(code))
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Applied to a hook that declared no timeout of its own.
    pub default_hook_timeout: Duration,
    /// Global deadline for the entire shutdown sequence, independent of
    /// per-hook timeouts.
    pub shutdown_budget: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            default_hook_timeout: Duration::from_secs(10),
            shutdown_budget: Duration::from_secs(30),
        }
    }
}

/// What startup produced: the prefix of services whose start hook actually
/// ran, needed so a failed startup can run a compensating reverse-order stop.
pub struct StartOutcome {
    pub started: Vec<Key>,
}

pub struct StartFailure {
    pub started: Vec<Key>,
    pub error: Error,
}

pub struct ShutdownReport {
    pub blame: Vec<BlameRecord>,
    pub force_exited: bool,
}

/// Orchestrates startup and shutdown over a built [`Container`]'s dependency
/// graph.
pub struct Lifecycle {
    container: Container,
    config: LifecycleConfig,
    cancellation: CancellationToken,
}

impl Lifecycle {
    pub fn new(container: Container, config: LifecycleConfig) -> Self {
        Lifecycle { container, config, cancellation: CancellationToken::new() }
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Deterministic topological start order over the container's graph.
    pub fn start_order(&self) -> Result<Vec<Key>> {
        let snapshot = self.container.snapshot()?;
        let graph = forge_core::Graph::from_edges(&snapshot.edges);
        graph.topological_order(&snapshot.nodes).map_err(|unresolved| Error::StartHookFailed {
            key: format!("{unresolved:?}"),
            source: anyhow::anyhow!("internal error: graph has a cycle after build"),
        })
    }

    /// Run start hooks front-to-back. On the first failure, runs a
    /// compensating reverse-order stop over everything already started.
    pub async fn start(&self) -> std::result::Result<StartOutcome, StartFailure> {
        let order = self.start_order().map_err(|e| StartFailure { started: vec![], error: e })?;
        let mut started = Vec::with_capacity(order.len());
        let trace_id = uuid::Uuid::new_v4().to_string();

        for key in &order {
            let Some(descriptor) = self.container.descriptor(key) else { continue };
            let Some(start_hook) = descriptor.start_hook() else {
                started.push(key.clone());
                continue;
            };

            let timeout = descriptor.hook_timeout().unwrap_or(self.config.default_hook_timeout);
            let ctx = HookContext::with_timeout(self.cancellation.clone(), timeout)
                .with_ids(Some(trace_id.clone()), Some(key.canonical()));
            let span = ctx.span();
            let begin = Instant::now();

            let outcome = tokio::time::timeout(timeout, start_hook(&ctx).instrument(span)).await;
            match outcome {
                Ok(Ok(())) => {
                    info!(service = %key, elapsed_ms = begin.elapsed().as_millis() as u64, "start hook completed");
                    started.push(key.clone());
                }
                Ok(Err(source)) => {
                    let error = Error::StartHookFailed { key: key.canonical(), source };
                    self.compensate(&started).await;
                    return Err(StartFailure { started, error });
                }
                Err(_elapsed) => {
                    let error = Error::StartHookTimedOut { key: key.canonical(), declared: timeout };
                    self.compensate(&started).await;
                    return Err(StartFailure { started, error });
                }
            }
        }

        Ok(StartOutcome { started })
    }

    async fn compensate(&self, started: &[Key]) {
        let terminate = default_terminate();
        let _ = self.shutdown_with(started, terminate, self.config.shutdown_budget).await;
    }

    /// Run stop hooks in strict reverse of `started`, under the global
    /// shutdown budget. If the budget elapses, `terminate` is invoked and
    /// `force_exited` is reported (real process exits never return here).
    pub async fn shutdown(&self, started: &[Key], terminate: TerminateFn) -> ShutdownReport {
        self.shutdown_with(started, terminate, self.config.shutdown_budget).await
    }

    async fn shutdown_with(
        &self,
        started: &[Key],
        terminate: TerminateFn,
        budget: Duration,
    ) -> ShutdownReport {
        let blame: Arc<Mutex<Vec<BlameRecord>>> = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(tokio::sync::Notify::new());

        let trace_id = uuid::Uuid::new_v4().to_string();
        let orchestration = {
            let container = self.container.clone();
            let started = started.to_vec();
            let default_timeout = self.config.default_hook_timeout;
            let blame = blame.clone();
            let done = done.clone();
            tokio::spawn(async move {
                run_stop_hooks(&container, &started, default_timeout, &trace_id, &blame).await;
                done.notify_one();
            })
        };

        let force_exited = tokio::select! {
            _ = done.notified() => {
                let _ = orchestration.await;
                false
            }
            _ = tokio::time::sleep(budget) => {
                tracing::error!(budget_ms = budget.as_millis() as u64, "global shutdown budget exceeded; force-exiting");
                eprintln!("global shutdown budget of {budget:?} exceeded; force-exiting");
                terminate(1);
                true
            }
        };

        let blame = blame.lock().clone();
        ShutdownReport { blame, force_exited }
    }
}

async fn run_stop_hooks(
    container: &Container,
    started: &[Key],
    default_timeout: Duration,
    trace_id: &str,
    blame: &Arc<Mutex<Vec<BlameRecord>>>,
) {
    let cancellation = CancellationToken::new();
    for key in started.iter().rev() {
        let Some(descriptor) = container.descriptor(key) else { continue };
        let Some(stop_hook) = descriptor.stop_hook() else { continue };

        let timeout = descriptor.hook_timeout().unwrap_or(default_timeout);
        let ctx = HookContext::with_timeout(cancellation.clone(), timeout)
            .with_ids(Some(trace_id.to_string()), Some(key.canonical()));
        let span = ctx.span();
        let begin = Instant::now();

        match tokio::time::timeout(timeout, stop_hook(&ctx).instrument(span)).await {
            Ok(Ok(())) => {
                info!(service = %key, elapsed_ms = begin.elapsed().as_millis() as u64, "stop hook completed");
            }
            Ok(Err(source)) => {
                tracing::warn!(service = %key, error = %source, "stop hook returned an error");
            }
            Err(_elapsed) => {
                let record = BlameRecord::emit(&key.canonical(), timeout, begin.elapsed());
                blame.lock().push(record);
            }
        }
    }
}
