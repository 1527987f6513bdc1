//! Convenience result type alias for KeyStock.

use crate::error::AppError;

/// A specialized `Result` type for KeyStock operations.
pub type AppResult<T> = Result<T, AppError>;
