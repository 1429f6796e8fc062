//! Care Error Types
//!
//! Care-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Care-specific result type alias
pub type CareResult<T> = Result<T, CareError>;

#[derive(Debug, Error)]
pub enum CareError {
    /// 存在しない、または呼び出し元のスコープ外
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Validation(#[from] listing::ValidationErrors),

    #[error("{0}")]
    Forbidden(String),

    /// セッション検証より前にスコープ解決が呼ばれた
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CareError::NotFound(_) => ErrorKind::NotFound,
            CareError::Conflict(_) => ErrorKind::Conflict,
            CareError::InvalidInput(_) | CareError::Validation(_) => ErrorKind::BadRequest,
            CareError::Forbidden(_) => ErrorKind::Forbidden,
            CareError::Unauthenticated => ErrorKind::Unauthorized,
            CareError::Database(_) | CareError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            CareError::Database(_) | CareError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            CareError::Validation(errors) => AppError::from(errors.clone()),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            CareError::Database(e) => tracing::error!(error = %e, "Care database error"),
            CareError::Internal(msg) => tracing::error!(message = %msg, "Care internal error"),
            CareError::Forbidden(msg) => tracing::warn!(reason = %msg, "Care access denied"),
            _ => tracing::debug!(error = %self, "Care error"),
        }
    }
}

impl IntoResponse for CareError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

// Health-center lookups are served to the auth crate through its directory trait.
impl From<CareError> for auth::AuthError {
    fn from(err: CareError) -> Self {
        match err {
            CareError::Database(e) => auth::AuthError::Database(e),
            other => auth::AuthError::Internal(other.to_string()),
        }
    }
}
