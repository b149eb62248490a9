// SPDX-License-Identifier: MIT

//! Type-routed in-process pub/sub: bounded per-subscriber queues, panic
//! isolation per handler, and drain-on-close.
//!
//! Implements component H of the service-application framework.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bus;
mod handle;

pub use bus::{EventBus, SubscribeOptions};
pub use handle::UnsubscribeHandle;
