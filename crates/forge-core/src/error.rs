// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::key::Key;

/// Errors raised by registration and resolution.
#[derive(Debug, Error)]
pub enum Error {
    #[error("service not found: {0}")]
    NotFound(String),

    #[error("dependency cycle detected: {}", .chain.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(" -> "))]
    Cycle { chain: Vec<Key> },

    #[error("provider for {key} failed: {source}")]
    ProviderFailed { key: String, #[source] source: anyhow::Error },

    #[error("duplicate registration for {0} (use .replace() to allow overwriting)")]
    Duplicate(String),

    #[error("container already built")]
    AlreadyBuilt,

    #[error("container not yet built")]
    NotYetBuilt,

    #[error("type mismatch resolving {key}: expected {expected}, found {found}")]
    TypeMismatch { key: String, expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
