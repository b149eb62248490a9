// SPDX-License-Identifier: MIT

//! Cron-driven job scheduling on top of the `cron` crate: fresh job
//! instances per fire, skip-if-running concurrency, and per-fire timeouts.
//!
//! Implements component G of the service-application framework.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod job;
mod schedule;
mod scheduler;

pub use error::{Error, Result};
pub use job::Job;
pub use scheduler::{JobStatus, Scheduler};
