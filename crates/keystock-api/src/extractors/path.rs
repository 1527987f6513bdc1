//! Typed path parameter helpers.

use keystock_core::error::AppError;
use keystock_core::types::PrincipalId;

/// Parses a principal id from a path segment.
pub fn parse_principal(s: &str) -> Result<PrincipalId, AppError> {
    match s.parse::<PrincipalId>() {
        Ok(id) if id.get() > 0 => Ok(id),
        _ => Err(AppError::validation(format!("Invalid principal id: {s}"))),
    }
}
