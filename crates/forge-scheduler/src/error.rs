// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("container: {0}")]
    Container(#[from] forge_core::Error),

    #[error("invalid schedule {expr:?}: {source}")]
    InvalidSchedule { expr: String, #[source] source: anyhow::Error },

    #[error("job {0:?} is already registered")]
    AlreadyRegistered(String),
}

pub type Result<T> = std::result::Result<T, Error>;
