//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use keystock_core::error::{AppError, ErrorKind};
use keystock_core::types::PoolKey;

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl ApiErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Wrapper so `AppError` can be returned from handlers.
///
/// `AppError` lives in `keystock-core`, which has no HTTP dependency, so
/// the conversion is implemented on this local newtype.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::AccessDenied => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Storage
            | ErrorKind::Configuration
            | ErrorKind::Serialization => {
                tracing::error!(kind = %err.kind, error = %err, "Internal server error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorResponse::new(
                        "INTERNAL_ERROR",
                        "An internal error occurred",
                    )),
                )
                    .into_response();
            }
        };

        (status, Json(ApiErrorResponse::new(error_code, err.message))).into_response()
    }
}

/// Response for an allocation against an empty pool.
pub fn no_stock(pool: &PoolKey) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new(
            "NO_STOCK",
            format!("No keys left in {pool}"),
        )),
    )
        .into_response()
}
