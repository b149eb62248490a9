// SPDX-License-Identifier: MIT

//! Registers workers, fans start/stop out to their supervisors, and reports
//! critical failures upward.

use std::collections::HashMap;
use std::sync::Arc;

use forge_core::Container;
use parking_lot::Mutex as PlMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::policy::WorkerPolicy;
use crate::state::SupervisorState;
use crate::supervisor::{supervise, WorkerHandle};
use crate::worker::Worker;

struct Registered {
    name: String,
    critical: bool,
    policy: WorkerPolicy,
    worker: Arc<dyn Worker>,
}

struct Inner {
    registered: Vec<Registered>,
    handles: HashMap<String, WorkerHandle>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
}

/// Fans registered workers out to one supervisor task each.
///
/// Cheap to clone (wraps an `Arc`); the clone returned from [`WorkerManager::new`]
/// and the critical-failure receiver are meant to live on the application side.
#[derive(Clone)]
pub struct WorkerManager {
    inner: Arc<PlMutex<Inner>>,
    shutdown: CancellationToken,
    critical_tx: mpsc::UnboundedSender<String>,
}

impl WorkerManager {
    /// Returns the manager plus a receiver that yields a worker name every
    /// time a critical worker's circuit breaker trips — the application is
    /// expected to initiate graceful shutdown on receipt.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (critical_tx, critical_rx) = mpsc::unbounded_channel();
        let manager = WorkerManager {
            inner: Arc::new(PlMutex::new(Inner {
                registered: Vec::new(),
                handles: HashMap::new(),
                tasks: Vec::new(),
                started: false,
            })),
            shutdown: CancellationToken::new(),
            critical_tx,
        };
        (manager, critical_rx)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Registers a single worker. Errors if the name collides or the manager
    /// has already started.
    pub fn register(
        &self,
        name: impl Into<String>,
        worker: Arc<dyn Worker>,
        policy: WorkerPolicy,
    ) -> Result<()> {
        let name = name.into();
        let critical = worker.critical();
        let mut inner = self.inner.lock();
        if inner.started {
            return Err(Error::AlreadyStarted);
        }
        if inner.registered.iter().any(|r| r.name == name) {
            return Err(Error::AlreadyRegistered(name));
        }
        inner.registered.push(Registered { name, critical, policy, worker });
        Ok(())
    }

    /// Registers `size` independently supervised instances produced by
    /// `factory`, named `{base_name}-1` through `{base_name}-{size}`.
    pub fn register_pool(
        &self,
        base_name: impl Into<String>,
        size: usize,
        policy: WorkerPolicy,
        factory: impl Fn(usize) -> Arc<dyn Worker>,
    ) -> Result<()> {
        let base_name = base_name.into();
        for index in 1..=size {
            let worker = factory(index);
            self.register(format!("{base_name}-{index}"), worker, policy.clone())?;
        }
        Ok(())
    }

    /// Auto-discovers registered, non-transient container services that carry
    /// the [`Worker`] facet and registers them under their canonical key.
    /// Workers registered manually via [`Self::register`] are skipped if
    /// already present under the same name.
    pub fn discover(&self, container: &Container, default_policy: WorkerPolicy) -> Result<usize> {
        let mut discovered = 0;
        for (key, scope) in container.registrations() {
            if scope == forge_core::Scope::Transient {
                continue;
            }
            if !container.has_facet::<Arc<dyn Worker>>(&key) {
                continue;
            }
            let Some(worker) = container.facet::<Arc<dyn Worker>>(&key)? else { continue };
            let name = key.canonical();
            let mut inner = self.inner.lock();
            if inner.started {
                return Err(Error::AlreadyStarted);
            }
            if inner.registered.iter().any(|r| r.name == name) {
                continue;
            }
            let critical = worker.critical();
            inner.registered.push(Registered {
                name,
                critical,
                policy: default_policy.clone(),
                worker,
            });
            discovered += 1;
        }
        Ok(discovered)
    }

    /// Spawns one supervisor task per registered worker. Workers start after
    /// all lifecycle start hooks have completed — callers are expected to
    /// call this after `Lifecycle::start`.
    pub fn start(&self) {
        let registered = {
            let mut inner = self.inner.lock();
            inner.started = true;
            std::mem::take(&mut inner.registered)
        };

        let mut inner = self.inner.lock();
        for r in registered {
            let state = Arc::new(PlMutex::new(SupervisorState::Idle));
            inner.handles.insert(
                r.name.clone(),
                WorkerHandle { name: r.name.clone(), critical: r.critical, state: state.clone() },
            );

            let shutdown = self.shutdown.clone();
            let critical_tx = self.critical_tx.clone();
            let name = r.name.clone();
            let on_critical_trip: Arc<dyn Fn(String) + Send + Sync> =
                Arc::new(move |worker_name: String| {
                    let _ = critical_tx.send(worker_name);
                });

            let task = tokio::spawn(supervise(
                name,
                r.critical,
                r.worker,
                r.policy,
                shutdown,
                state,
                on_critical_trip,
            ));
            inner.tasks.push(task);
        }
    }

    /// Signals every supervisor to stop and waits for all supervisor tasks to
    /// exit.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let tasks = {
            let mut inner = self.inner.lock();
            std::mem::take(&mut inner.tasks)
        };
        futures::future::join_all(tasks).await;
    }

    pub fn handle(&self, name: &str) -> Option<WorkerHandle> {
        self.inner.lock().handles.get(name).cloned()
    }

    /// Same as [`Self::handle`], but fails loudly instead of returning
    /// `None`. Used internally wherever a caller already knows a name was
    /// reported back by a running supervisor (e.g. the critical-failure
    /// channel) and a missing handle would indicate manager wiring is broken.
    pub fn require_handle(&self, name: &str) -> Result<WorkerHandle> {
        self.handle(name).ok_or_else(|| Error::NoSuchWorker(name.to_string()))
    }

    pub fn handles(&self) -> Vec<WorkerHandle> {
        self.inner.lock().handles.values().cloned().collect()
    }
}
