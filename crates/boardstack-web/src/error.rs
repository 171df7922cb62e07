//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boardstack_core::BoardError;
use boardstack_db::DbError;
use serde_json::json;
use tracing::error;

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Board(BoardError),
    Status(StatusCode, String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Status(StatusCode::BAD_REQUEST, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Status(StatusCode::NOT_FOUND, msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Status(status, _) => *status,
            ApiError::Board(err) => match err {
                BoardError::Unauthenticated | BoardError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                BoardError::Forbidden => StatusCode::FORBIDDEN,
                BoardError::ValidationError(_) | BoardError::Conflict(_) => StatusCode::BAD_REQUEST,
                BoardError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                e if e.is_not_found() => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        ApiError::Board(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Board(BoardError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Status(_, msg) => msg.clone(),
            ApiError::Board(err) if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE => {
                error!(error = %err, "Request failed");
                "internal server error".to_string()
            }
            ApiError::Board(err) => err.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BoardError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (BoardError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (BoardError::Forbidden, StatusCode::FORBIDDEN),
            (BoardError::BoardNotFound("b".into()), StatusCode::NOT_FOUND),
            (BoardError::Database(DbError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (BoardError::validation("bad"), StatusCode::BAD_REQUEST),
            (BoardError::conflict("dup"), StatusCode::BAD_REQUEST),
            (BoardError::ServiceUnavailable("mail".into()), StatusCode::SERVICE_UNAVAILABLE),
            (BoardError::Template("t".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
