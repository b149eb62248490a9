// SPDX-License-Identifier: MIT

//! Composition root of the service-application framework: wires the DI
//! container, lifecycle engine, worker manager, scheduler, and event bus
//! together, and owns signal handling and the concrete logging sink.
//!
//! Implements component I of the service-application framework.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod application;
pub mod logging;

pub use application::{Application, WorkerFacet};

pub use forge_config as config;
pub use forge_core as core;
pub use forge_eventbus as eventbus;
pub use forge_lifecycle as lifecycle;
pub use forge_scheduler as scheduler;
pub use forge_worker as worker;
