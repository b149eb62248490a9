// SPDX-License-Identifier: MIT

//! Lifecycle engine: deterministic topological ordering, startup/shutdown
//! orchestration with per-hook and global timeouts, and blame reporting.
//!
//! Implements component D of the service-application framework, built on
//! top of `forge_core::Container`'s graph snapshot.

mod blame;
mod error;
mod orchestrator;
mod signal;

pub use blame::BlameRecord;
pub use error::{Error, Result};
pub use orchestrator::{
    default_terminate, Lifecycle, LifecycleConfig, ShutdownReport, StartFailure, StartOutcome,
    TerminateFn,
};
pub use signal::{drive_shutdown, wait_for_trigger, ShutdownTrigger};
