use thiserror::Error;

use crate::domain::types::TypeConstraintError;

/// Errors surfaced by catalog store implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A pooled connection could not be obtained.
    #[error("connection error: {0}")]
    Connection(#[from] diesel::r2d2::PoolError),
    /// The database rejected or failed a statement.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// `additional_data` could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored row no longer satisfies the domain constraints.
    #[error("validation error: {0}")]
    Validation(#[from] TypeConstraintError),
    /// The store was used after `close`.
    #[error("store is closed")]
    Closed,
    /// Failure reported by a backend that is not Diesel-based.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
