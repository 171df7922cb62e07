//! Store error types.

use thiserror::Error;

/// Errors raised by a [`BoardStore`](crate::BoardStore) backend.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redis connection error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;
