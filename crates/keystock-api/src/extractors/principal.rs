//! `Principal` extractor: reads the acting principal from the
//! `X-Principal-Id` header and resolves its request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use keystock_core::error::AppError;
use keystock_core::types::PrincipalId;
use keystock_service::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the acting principal.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Acting principal context available in handlers.
#[derive(Debug, Clone)]
pub struct Principal(pub RequestContext);

impl Principal {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for Principal {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing X-Principal-Id header"))?;

        let principal: PrincipalId = raw
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid X-Principal-Id header"))?;
        if principal.get() <= 0 {
            return Err(AppError::unauthorized("Invalid X-Principal-Id header").into());
        }

        Ok(Principal(state.access_service.context(principal)))
    }
}
