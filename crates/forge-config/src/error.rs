// SPDX-License-Identifier: MIT

use crate::validate::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Backend(err.into())
    }
}
