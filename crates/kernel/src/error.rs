//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::store::StoreError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("content store error")]
    Store(#[from] StoreError),

    #[error("template error")]
    Template(#[from] tera::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Store(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Log the error at a level matching its severity.
    pub fn log(&self) {
        match self {
            AppError::NotFound => tracing::debug!("not found"),
            AppError::BadRequest(msg) => tracing::debug!(message = %msg, "bad request"),
            AppError::Internal(e) => tracing::error!(error = %e, "internal server error"),
            AppError::Store(e) => tracing::error!(error = %e, "content store error"),
            AppError::Template(e) => tracing::error!(error = ?e, "template error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();

        // Internal details are logged, never shown.
        let body = match &self {
            AppError::Internal(_) | AppError::Store(_) | AppError::Template(_) => {
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(StoreError::Transport("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
