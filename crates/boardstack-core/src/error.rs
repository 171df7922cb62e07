//! Centralized error types for BoardStack.

use thiserror::Error;

/// Main error type for BoardStack operations.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Label not found: {0}")]
    LabelNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Invitation not found: {0}")]
    InvitationNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] boardstack_db::DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(String),
}

/// Result type for BoardStack operations.
pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether this error means the addressed record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BoardNotFound(_)
                | Self::ListNotFound(_)
                | Self::CardNotFound(_)
                | Self::LabelNotFound(_)
                | Self::MemberNotFound(_)
                | Self::InvitationNotFound(_)
                | Self::UserNotFound(_)
                | Self::Database(boardstack_db::DbError::NotFound(_))
        )
    }
}
