use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::{repo::StoreError, validation::FieldErrors};

/// Classified failure of an identity operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("conflict: {0}")]
    Conflict(FieldErrors),
    /// Unknown phone and wrong password both map here.
    #[error("phone or password is wrong")]
    InvalidCredentials,
    #[error("invalid token")]
    Unauthorized,
    #[error("user not found")]
    NotFound,
    /// Request body could not be decoded.
    #[error("Invalid Format")]
    InvalidFormat,
    #[error(transparent)]
    Dependency(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidCredentials
            | AppError::NotFound
            | AppError::InvalidFormat => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Writes that can collide on the phone index classify `PhoneTaken` as a
/// conflict themselves; anywhere else it is unexpected.
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Backend(e) => AppError::Dependency(e),
            StoreError::PhoneTaken => {
                AppError::Dependency(anyhow::anyhow!("unexpected phone uniqueness violation"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(fields) => json!({ "message": "validation failed", "fields": fields }),
            AppError::Conflict(fields) => json!({ "message": "conflict", "fields": fields }),
            AppError::Dependency(e) => {
                error!(error = %e, "dependency failure");
                json!({ "message": "internal server error" })
            }
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
