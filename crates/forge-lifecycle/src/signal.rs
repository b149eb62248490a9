// SPDX-License-Identifier: MIT

//! Interactive-interrupt and terminate-signal handling.

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::orchestrator::{Lifecycle, ShutdownReport, TerminateFn};
use forge_core::Key;

/// Which trigger caused the orchestrator to begin shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// First SIGINT (Ctrl-C / interactive interrupt).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// The application's own context was cancelled.
    Cancelled,
}

/// Waits for the first shutdown-triggering signal or cancellation.
pub async fn wait_for_trigger(cancellation: &CancellationToken) -> anyhow::Result<ShutdownTrigger> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigint.recv() => Ok(ShutdownTrigger::Interrupt),
        _ = sigterm.recv() => Ok(ShutdownTrigger::Terminate),
        _ = cancellation.cancelled() => Ok(ShutdownTrigger::Cancelled),
    }
}

/// Drives the full signal → shutdown dance:
///
/// - A terminate-like trigger (SIGTERM, or a cancelled context) runs the
///   standard graceful path with no second-signal escalation.
/// - An interactive interrupt logs a hint and starts shutdown in the
///   background so a *second* interrupt can still be observed; the second
///   interrupt calls `terminate` immediately with a nonzero status.
pub async fn drive_shutdown(
    lifecycle: &Lifecycle,
    trigger: ShutdownTrigger,
    started: &[Key],
    terminate: TerminateFn,
) -> ShutdownReport {
    match trigger {
        ShutdownTrigger::Terminate | ShutdownTrigger::Cancelled => {
            info!(?trigger, "shutting down gracefully");
            lifecycle.shutdown(started, terminate).await
        }
        ShutdownTrigger::Interrupt => {
            info!("received interrupt, shutting down gracefully (press again to force)");

            let shutdown_fut = lifecycle.shutdown(started, terminate.clone());
            tokio::pin!(shutdown_fut);

            let second_interrupt = async {
                if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                    sigint.recv().await;
                }
            };
            tokio::pin!(second_interrupt);

            tokio::select! {
                report = &mut shutdown_fut => report,
                _ = &mut second_interrupt => {
                    warn!("received second interrupt, force-exiting");
                    terminate(1);
                    shutdown_fut.await
                }
            }
        }
    }
}

impl std::fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ShutdownTrigger::Interrupt => "interrupt",
            ShutdownTrigger::Terminate => "terminate",
            ShutdownTrigger::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}
