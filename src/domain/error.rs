//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input to the bookmark model.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid bookmarks format: {0}")]
    InvalidFormat(String),

    #[error("failed to parse JSON: {0}")]
    ParseFailure(String),

    #[error("failed to encode JSON: {0}")]
    Encode(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
