// SPDX-License-Identifier: MIT

//! Composes the container, lifecycle engine, worker manager, scheduler, and
//! event bus into the application's single entry point.

use std::process::ExitCode;
use std::sync::Arc;

use forge_core::Container;
use forge_eventbus::EventBus;
use forge_lifecycle::{
    default_terminate, drive_shutdown, wait_for_trigger, Lifecycle, LifecycleConfig,
};
use forge_scheduler::Scheduler;
use forge_worker::{as_worker_facet, WorkerManager, WorkerPolicy};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// The composed application: a built container, a lifecycle orchestrator
/// over its dependency graph, a worker manager, a scheduler, and an event
/// bus, all wired together and started/stopped as one unit.
pub struct Application {
    container: Container,
    lifecycle: Lifecycle,
    workers: WorkerManager,
    critical_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    scheduler: Scheduler,
    bus: EventBus,
    default_worker_policy: WorkerPolicy,
}

impl Application {
    pub fn new(container: Container) -> Self {
        Self::with_config(container, LifecycleConfig::default(), WorkerPolicy::default())
    }

    /// Builds the application, registering the event bus and the scheduler
    /// into `container` as singleton instances carrying the worker facet, so
    /// [`forge_worker::WorkerManager::discover`] picks them up automatically
    /// alongside any domain workers the caller registered the same way.
    pub fn with_config(
        container: Container,
        lifecycle_config: LifecycleConfig,
        default_worker_policy: WorkerPolicy,
    ) -> Self {
        let bus = EventBus::new();
        let scheduler = Scheduler::new(container.clone());

        // Infallible: callers pass `container` in before calling `build()`,
        // and `EventBus`/`Scheduler` are framework-owned types no caller
        // registers directly, so there is no duplicate-registration or
        // already-built error to hit here.
        #[allow(clippy::expect_used)]
        {
            container
                .for_type::<EventBus>()
                .facet(as_worker_facet)
                .instance(bus.clone())
                .expect("registering the event bus singleton cannot fail before build");
            container
                .for_type::<Scheduler>()
                .facet(as_worker_facet)
                .instance(scheduler.clone())
                .expect("registering the scheduler singleton cannot fail before build");
        }

        let (workers, critical_rx) = WorkerManager::new();
        let lifecycle = Lifecycle::new(container.clone(), lifecycle_config);

        Application {
            container,
            lifecycle,
            workers,
            critical_rx: Mutex::new(Some(critical_rx)),
            scheduler,
            bus,
            default_worker_policy,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The token [`Self::run`] treats as a shutdown trigger — cancel it to
    /// request graceful shutdown from outside a signal (tests, a health
    /// check, an admin endpoint).
    pub fn cancellation(&self) -> tokio_util::sync::CancellationToken {
        self.lifecycle.cancellation()
    }

    pub fn workers(&self) -> &WorkerManager {
        &self.workers
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Builds the container, runs start hooks in topological order, starts
    /// workers (auto-discovered plus manually registered), waits for a
    /// shutdown trigger — a signal, the application's own cancellation, or a
    /// critical worker tripping its breaker — then runs stop hooks in
    /// reverse order under the shutdown budget.
    ///
    /// Returns a nonzero exit code if the shutdown budget or a second
    /// interrupt forced an early exit; in the real terminate path the
    /// process exits directly and this never returns.
    pub async fn run(&self) -> ExitCode {
        if let Err(error) = self.container.build() {
            tracing::error!(%error, "container build failed");
            return ExitCode::FAILURE;
        }

        if let Err(error) = self.workers.discover(&self.container, self.default_worker_policy.clone()) {
            tracing::error!(%error, "worker auto-discovery failed");
            return ExitCode::FAILURE;
        }

        let cancellation = self.lifecycle.cancellation();

        let start_outcome = match self.lifecycle.start().await {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::error!(error = %failure.error, "startup failed; compensating stop already ran");
                return ExitCode::FAILURE;
            }
        };

        self.workers.start();

        let Some(mut critical_rx) = self.critical_rx.lock().take() else {
            tracing::error!("Application::run called more than once");
            return ExitCode::FAILURE;
        };

        let trigger = tokio::select! {
            result = wait_for_trigger(&cancellation) => {
                result.unwrap_or(forge_lifecycle::ShutdownTrigger::Cancelled)
            }
            Some(name) = critical_rx.recv() => {
                match self.workers.require_handle(&name) {
                    Ok(handle) => tracing::error!(worker = %name, state = ?handle.state(), "critical worker tripped its circuit breaker; initiating shutdown"),
                    Err(e) => tracing::error!(worker = %name, error = %e, "critical worker tripped but manager has no handle for it"),
                }
                cancellation.cancel();
                forge_lifecycle::ShutdownTrigger::Cancelled
            }
        };

        self.workers.stop().await;

        let report =
            drive_shutdown(&self.lifecycle, trigger, &start_outcome.started, default_terminate()).await;

        if report.force_exited {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Convenience re-export so callers composing custom workers don't need a
/// direct `forge_worker` dependency just for this one type.
pub type WorkerFacet = Arc<dyn forge_worker::Worker>;
