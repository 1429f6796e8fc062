//! Stock Error Types
//!
//! Stock-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Stock-specific result type alias
pub type StockResult<T> = Result<T, StockError>;

#[derive(Debug, Error)]
pub enum StockError {
    /// 存在しない、または呼び出し元のスコープ外
    #[error("Transfer not found")]
    NotFound,

    /// pending ではなくなっている（並行した処理に負けた場合も含む）
    #[error("Transfer already resolved")]
    AlreadyResolved,

    /// 状態機械が許さない遷移の指定
    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Validation(#[from] listing::ValidationErrors),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StockError::NotFound => ErrorKind::NotFound,
            StockError::AlreadyResolved => ErrorKind::Conflict,
            StockError::InvalidTransition(_)
            | StockError::InvalidInput(_)
            | StockError::Validation(_) => ErrorKind::BadRequest,
            StockError::Forbidden(_) => ErrorKind::Forbidden,
            StockError::Database(_) | StockError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            StockError::Database(_) | StockError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            StockError::Validation(errors) => AppError::from(errors.clone()),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            StockError::Database(e) => tracing::error!(error = %e, "Stock database error"),
            StockError::Internal(msg) => tracing::error!(message = %msg, "Stock internal error"),
            StockError::Forbidden(msg) => tracing::warn!(reason = %msg, "Stock access denied"),
            StockError::AlreadyResolved => tracing::info!("Transfer update lost to a concurrent resolution"),
            _ => tracing::debug!(error = %self, "Stock error"),
        }
    }
}

impl IntoResponse for StockError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

// Pending transfer counts are served to the care dashboard.
impl From<StockError> for care::CareError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Database(e) => care::CareError::Database(e),
            other => care::CareError::Internal(other.to_string()),
        }
    }
}

// Destination health centers are located through the auth directory trait.
impl From<auth::AuthError> for StockError {
    fn from(err: auth::AuthError) -> Self {
        match err {
            auth::AuthError::Database(e) => StockError::Database(e),
            other => StockError::Internal(other.to_string()),
        }
    }
}
