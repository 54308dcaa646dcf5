//! Error taxonomy shared by every subsystem.
//!
//! One enum per the exit-code table: callers branch on `kind()` rather than
//! matching every variant, and the HTTP layer (out of scope here) maps
//! `status_hint()` straight onto a response code.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(#[from] ConflictKind),

    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Subkinds of `Conflict`, each surfaced verbatim to callers per the propagation policy.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ConflictKind {
    #[error("version mismatch, entity was concurrently updated")]
    ConcurrentUpdate,
    #[error("tournament has already started")]
    TournamentStarted,
    #[error("tournament has reached its participant cap")]
    TournamentFull,
    #[error("lock is held by another owner")]
    LockHeld,
    #[error("lock token does not match the current holder")]
    LockMismatch,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn is_concurrent_update(&self) -> bool {
        matches!(self, CoreError::Conflict(ConflictKind::ConcurrentUpdate))
    }
    pub fn is_lock_held(&self) -> bool {
        matches!(self, CoreError::Conflict(ConflictKind::LockHeld))
    }
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    /// Numeric status a thin HTTP layer would use verbatim; the core never emits HTTP itself.
    pub fn status_hint(&self) -> u16 {
        match self {
            CoreError::InvalidInput(_) => 400,
            CoreError::Unauthorized => 401,
            CoreError::Forbidden(_) => 403,
            CoreError::NotFound(_) => 404,
            CoreError::Conflict(_) => 409,
            CoreError::ValidationFailure(_) => 422,
            CoreError::Timeout(_) => 504,
            CoreError::Transient(_) => 503,
            CoreError::Internal(_) => 500,
        }
    }
}

impl From<tokio_postgres::Error> for CoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if db_err.code() == &tokio_postgres::error::SqlState::UNIQUE_VIOLATION {
                return CoreError::Conflict(ConflictKind::ConcurrentUpdate);
            }
        }
        if err.is_closed() {
            return CoreError::Transient(err.to_string());
        }
        CoreError::Internal(err.to_string())
    }
}

impl From<redis::RedisError> for CoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal() {
            CoreError::Transient(err.to_string())
        } else {
            CoreError::Internal(err.to_string())
        }
    }
}

impl From<bb8::RunError<redis::RedisError>> for CoreError {
    fn from(err: bb8::RunError<redis::RedisError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner.into(),
            bb8::RunError::TimedOut => CoreError::Transient("connection pool timed out".into()),
        }
    }
}
