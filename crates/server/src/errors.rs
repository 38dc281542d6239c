use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::users::UserError;
use thiserror::Error;
use tracing::{debug, error};

/// Error returned by `/api/*` handlers. Server-side details never reach the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error("Not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::User(UserError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::User(UserError::DuplicateEmail) => StatusCode::CONFLICT,
            ApiError::User(UserError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::User(UserError::NotFound) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::User(UserError::Persistence(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Numeric code for logs; user errors keep their service code.
    pub fn code(&self) -> u16 {
        match self {
            ApiError::User(e) => e.code(),
            ApiError::NotFound => 1404,
            ApiError::Internal(_) => 1500,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let msg = if status.is_server_error() {
            error!(error = %self, code, "API error");
            "Server error".to_string()
        } else {
            debug!(error = %self, code, status = status.as_u16(), "request rejected");
            self.to_string()
        };
        (status, Json(ErrorBody::new(msg))).into_response()
    }
}
