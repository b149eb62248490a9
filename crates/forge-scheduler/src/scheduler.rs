// SPDX-License-Identifier: MIT

//! Wraps the `cron` crate: resolves a fresh job instance per fire,
//! skip-if-running concurrency, and per-job health status.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_core::{Container, HookContext};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

use crate::error::{Error, Result};
use crate::job::Job;
use crate::schedule::ParsedSchedule;

/// Per-job resolver: constructs a fresh `Arc<dyn Job>` from the container on
/// every fire. `T`'s concrete type is only known where `Scheduler::register`
/// is called, so this closure is how that knowledge survives into the
/// type-erased entry list.
type JobResolver = Arc<dyn Fn(&Container) -> std::result::Result<Arc<dyn Job>, forge_core::Error> + Send + Sync>;

/// External health snapshot for one registered job.
#[derive(Debug, Clone, Default)]
pub struct JobStatus {
    pub in_flight: bool,
    pub last_fire_millis_ago: Option<u64>,
    pub last_error: Option<String>,
}

struct JobEntry {
    name: String,
    schedule: ParsedSchedule,
    timeout: Duration,
    resolver: JobResolver,
    in_flight: AtomicBool,
    last_fire: Mutex<Option<std::time::Instant>>,
    last_error: Mutex<Option<String>>,
}

/// Registers cron-scheduled jobs and drives their fires. Implements
/// [`forge_worker::Worker`] so it is started and stopped like any other
/// worker.
#[derive(Clone)]
pub struct Scheduler {
    container: Container,
    jobs: Arc<Mutex<Vec<Arc<JobEntry>>>>,
}

impl Scheduler {
    pub fn new(container: Container) -> Self {
        forge_core::panic::install_hook();
        Scheduler { container, jobs: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Registers `T` (previously registered on the container, ideally as
    /// [`forge_core::Scope::Transient`]) to fire on `schedule`. An empty
    /// schedule registers the job disabled rather than erroring.
    pub fn register<T: Job>(&self, name: impl Into<String>, schedule: &str, timeout: Duration) -> Result<()> {
        let name = name.into();
        let parsed = ParsedSchedule::parse(schedule)?;

        let mut jobs = self.jobs.lock();
        if jobs.iter().any(|j| j.name == name) {
            return Err(Error::AlreadyRegistered(name));
        }

        let resolver: JobResolver = Arc::new(|container: &Container| {
            let concrete = container.resolve::<T>()?;
            Ok(concrete as Arc<dyn Job>)
        });

        jobs.push(Arc::new(JobEntry {
            name,
            schedule: parsed,
            timeout,
            resolver,
            in_flight: AtomicBool::new(false),
            last_fire: Mutex::new(None),
            last_error: Mutex::new(None),
        }));
        Ok(())
    }

    pub fn status(&self, name: &str) -> Option<JobStatus> {
        self.jobs.lock().iter().find(|j| j.name == name).map(|entry| JobStatus {
            in_flight: entry.in_flight.load(Ordering::SeqCst),
            last_fire_millis_ago: entry
                .last_fire
                .lock()
                .map(|t| t.elapsed().as_millis() as u64),
            last_error: entry.last_error.lock().clone(),
        })
    }
}

#[async_trait]
impl forge_worker::Worker for Scheduler {
    fn name(&self) -> &str {
        "scheduler"
    }

    async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let entries = self.jobs.lock().clone();
        let drivers = entries
            .into_iter()
            .map(|entry| tokio::spawn(drive(entry, self.container.clone(), shutdown.clone())))
            .collect::<Vec<_>>();
        futures::future::join_all(drivers).await;
        Ok(())
    }
}

async fn drive(entry: Arc<JobEntry>, container: Container, shutdown: CancellationToken) {
    if entry.schedule.is_disabled() {
        return;
    }

    loop {
        let Some(delay) = entry.schedule.next_delay() else { return };
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.cancelled() => return,
        }

        if entry.in_flight.swap(true, Ordering::SeqCst) {
            warn!(job = %entry.name, "previous fire still in flight, skipping");
            continue;
        }

        *entry.last_fire.lock() = Some(std::time::Instant::now());
        fire_once(&entry, &container, &shutdown).await;
        entry.in_flight.store(false, Ordering::SeqCst);
    }
}

async fn fire_once(entry: &JobEntry, container: &Container, shutdown: &CancellationToken) {
    let job = match (entry.resolver)(container) {
        Ok(job) => job,
        Err(e) => {
            error!(job = %entry.name, error = %e, "failed to resolve job instance");
            *entry.last_error.lock() = Some(e.to_string());
            return;
        }
    };

    let ctx = HookContext::with_timeout(shutdown.clone(), entry.timeout)
        .with_ids(Some(uuid::Uuid::new_v4().to_string()), Some(entry.name.clone()));
    let span = ctx.span();
    let outcome = tokio::time::timeout(
        entry.timeout,
        AssertUnwindSafe(job.run(&ctx)).catch_unwind().instrument(span),
    )
    .await;

    match outcome {
        Ok(Ok(Ok(()))) => {
            info!(job = %entry.name, "fire completed");
            *entry.last_error.lock() = None;
        }
        Ok(Ok(Err(source))) => {
            warn!(job = %entry.name, error = %source, "fire returned an error");
            *entry.last_error.lock() = Some(source.to_string());
        }
        Ok(Err(panic_payload)) => {
            let message = forge_core::panic::panic_message(&*panic_payload);
            let backtrace = forge_core::panic::take_backtrace();
            error!(job = %entry.name, panic = %message, backtrace = %backtrace, "fire panicked");
            *entry.last_error.lock() = Some(format!("panic: {message}"));
        }
        Err(_elapsed) => {
            warn!(job = %entry.name, timeout = ?entry.timeout, "fire timed out");
            *entry.last_error.lock() = Some("timed out".to_string());
        }
    }
}
