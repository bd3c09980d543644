use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid key length: expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid hex in key: {0}")]
    InvalidHex(String),

    #[error("Empty invite")]
    Empty,
}
