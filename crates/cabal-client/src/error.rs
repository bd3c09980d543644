use thiserror::Error;

use cabal_shared::Address;

/// Errors reported by a log library implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Store is not ready: {0}")]
    NotReady(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Backend error: {0}")]
    Other(String),
}

/// Errors produced by the dispatcher.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unknown cabal: {0}")]
    UnknownCabal(Address),

    #[error("Cabal {0} is not ready")]
    NotReady(Address),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
