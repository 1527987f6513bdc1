//! Access and grant handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use keystock_entity::grant::Grant;
use keystock_service::AccessSummary;

use crate::dto::request::GrantListQuery;
use crate::dto::response::{ApiResponse, GrantResponse, RevokeResponse};
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::extractors::path::parse_principal;
use crate::state::AppState;

/// GET /api/access/{principal}
pub async fn access_summary(
    State(state): State<AppState>,
    principal: Principal,
    Path(target): Path<String>,
) -> Result<Json<ApiResponse<AccessSummary>>, ApiError> {
    let target = parse_principal(&target)?;
    let summary = state.access_service.summary(&principal, target).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// PUT /api/grants/{principal}/{program}
pub async fn grant(
    State(state): State<AppState>,
    principal: Principal,
    Path((target, program)): Path<(String, String)>,
) -> Result<Json<ApiResponse<GrantResponse>>, ApiError> {
    let target = parse_principal(&target)?;
    let created = state
        .access_service
        .grant(&principal, target, &program)
        .await?;
    let program = state.config.inventory.program(&program)?;

    Ok(Json(ApiResponse::ok(GrantResponse {
        principal: target,
        program,
        created,
    })))
}

/// DELETE /api/grants/{principal}/{program}
pub async fn revoke(
    State(state): State<AppState>,
    principal: Principal,
    Path((target, program)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RevokeResponse>>, ApiError> {
    let target = parse_principal(&target)?;
    let outcome = state
        .access_service
        .revoke(&principal, target, &program)
        .await?;
    let program = state.config.inventory.program(&program)?;

    Ok(Json(ApiResponse::ok(RevokeResponse {
        principal: target,
        program,
        removed: outcome.removed,
        still_has_any_access: outcome.still_has_any_access,
    })))
}

/// GET /api/grants
pub async fn list_grants(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<GrantListQuery>,
) -> Result<Json<ApiResponse<Vec<Grant>>>, ApiError> {
    let filter = query.principal.as_deref().map(parse_principal).transpose()?;
    let grants = state.access_service.list_grants(&principal, filter).await?;
    Ok(Json(ApiResponse::ok(grants)))
}
