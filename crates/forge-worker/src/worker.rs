// SPDX-License-Identifier: MIT

//! The worker contract.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A supervised background unit of work.
///
/// The supervisor spawns `run` as its own task and signals shutdown by
/// cancelling the `CancellationToken` passed in — the worker is expected to
/// observe it both while blocked and while polling.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Runs until the worker's own logic completes, panics, or `shutdown` is
    /// cancelled. A clean `Ok(())` return with `shutdown` not cancelled is
    /// treated as a clean exit (see [`crate::WorkerPolicy::restart_on_clean_exit`]).
    async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()>;

    /// Whether a tripped circuit breaker for this worker should escalate to
    /// application shutdown. Defaults to non-critical so ordinary workers
    /// opt in explicitly.
    fn critical(&self) -> bool {
        false
    }
}

/// Converts a resolved `Arc<T>` into the worker facet the container's
/// auto-discovery mechanism (`Container::facet::<Arc<dyn Worker>>`) looks
/// for. Called from `Registration::facet` at registration time, where `T`'s
/// concrete type is still known.
pub fn as_worker_facet<T: Worker>(worker: Arc<T>) -> Arc<dyn Worker> {
    worker
}
