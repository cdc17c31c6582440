//! Domain errors for the tallybot core.

use thiserror::Error;

/// Errors surfaced by the ledger and dispatcher core.
///
/// `Validation` is user-correctable and echoed verbatim; `NotFound` marks a
/// stale reference (e.g. a delete button pressed twice); `Internal` covers
/// storage failures and defensively detected invariant violations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Internal(err.to_string())
    }
}
