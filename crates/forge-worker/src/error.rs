// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("container: {0}")]
    Container(#[from] forge_core::Error),

    #[error("worker {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("worker manager already started")]
    AlreadyStarted,

    #[error("no worker registered under name {0:?}")]
    NoSuchWorker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
