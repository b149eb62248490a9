// SPDX-License-Identifier: MIT

//! Configuration backend abstraction plus a concrete file+env implementation,
//! and a struct-tag validation helper.
//!
//! Implements component J of the service-application framework, plus the
//! external config interface from §6.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod backend;
mod defaultable;
mod error;
mod file_backend;
mod load;
pub mod validate;

pub use backend::{ConfigBackend, EnvBindable, Watchable, Writable};
pub use defaultable::Defaultable;
pub use error::{Error, Result};
pub use file_backend::FileBackend;
pub use load::{load_into, load_into_with_defaults};
pub use validate::{validate_struct, ValidationErrors};
