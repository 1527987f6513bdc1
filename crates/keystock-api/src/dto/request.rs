//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use keystock_core::error::AppError;

/// Maximum length of an import text, in characters.
pub const MAX_IMPORT_TEXT: usize = 4 * 1024 * 1024;

/// Key import request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImportRequest {
    /// Raw key list; values separated by newlines, commas, semicolons,
    /// tabs, or spaces.
    #[validate(length(max = 4194304, message = "Import text is too large"))]
    pub text: String,
}

/// Allocation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AllocateRequest {
    /// Principal receiving the key.
    #[validate(range(min = 1, message = "recipient_id must be a positive principal id"))]
    pub recipient_id: i64,
}

/// Grant listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantListQuery {
    /// Restrict the listing to one principal.
    pub principal: Option<String>,
}

/// Runs `validator` rules and maps failures to a validation error.
pub fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
