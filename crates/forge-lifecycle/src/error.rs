// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("container: {0}")]
    Container(#[from] forge_core::Error),

    #[error("start hook for {key} failed: {source}")]
    StartHookFailed { key: String, #[source] source: anyhow::Error },

    #[error("start hook for {key} timed out after {declared:?}")]
    StartHookTimedOut { key: String, declared: std::time::Duration },

    #[error("global shutdown budget exceeded")]
    GlobalShutdownTimeout,
}

pub type Result<T> = std::result::Result<T, Error>;
