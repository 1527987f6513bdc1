//! Stock handlers: counts, import, allocation, clearing, and mirror repair.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use keystock_entity::stock::PoolStatus;
use keystock_service::{Allocation, ClearSummary, ImportSummary, RebuildSummary, StockLevel};

use crate::dto::request::{AllocateRequest, ImportRequest, validate};
use crate::dto::response::{AllocatedKeyResponse, ApiResponse, StockCountResponse};
use crate::error::{ApiError, no_stock};
use crate::extractors::Principal;
use crate::state::AppState;

/// GET /api/stock
pub async fn overview(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ApiResponse<Vec<StockLevel>>>, ApiError> {
    let levels = state.report_service.stock_overview(&principal).await?;
    Ok(Json(ApiResponse::ok(levels)))
}

/// GET /api/stock/{program}/{duration}
pub async fn count(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
) -> Result<Json<ApiResponse<StockCountResponse>>, ApiError> {
    let unclaimed = state
        .report_service
        .count_unclaimed(&principal, &program, &duration)
        .await?;
    let pool = state.config.inventory.pool(&program, &duration)?;

    Ok(Json(ApiResponse::ok(StockCountResponse {
        program: pool.program().to_string(),
        duration: pool.duration().to_string(),
        unclaimed,
    })))
}

/// POST /api/stock/{program}/{duration}/import
pub async fn import(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    validate(&req)?;
    let summary = state
        .import_service
        .import_text(&principal, &program, &duration, &req.text)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/stock/{program}/{duration}/allocate
pub async fn allocate(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
    Json(req): Json<AllocateRequest>,
) -> Result<Response, ApiError> {
    validate(&req)?;
    let allocation = state
        .allocation_service
        .allocate(&principal, &program, &duration, req.recipient_id.into())
        .await?;

    match allocation {
        Allocation::Allocated(key) => {
            Ok(Json(ApiResponse::ok(AllocatedKeyResponse::from(key))).into_response())
        }
        Allocation::NoStock => {
            let pool = state.config.inventory.pool(&program, &duration)?;
            Ok(no_stock(&pool))
        }
    }
}

/// DELETE /api/stock/{program}/{duration}
pub async fn clear(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ClearSummary>>, ApiError> {
    let summary = state
        .report_service
        .clear_pool(&principal, &program, &duration)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/stock/{program}/{duration}/status
pub async fn status(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PoolStatus>>, ApiError> {
    let status = state
        .report_service
        .pool_status(&principal, &program, &duration)
        .await?;
    Ok(Json(ApiResponse::ok(status)))
}

/// POST /api/stock/{program}/{duration}/mirror/rebuild
pub async fn rebuild_mirror(
    State(state): State<AppState>,
    principal: Principal,
    Path((program, duration)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RebuildSummary>>, ApiError> {
    let summary = state
        .report_service
        .rebuild_mirror(&principal, &program, &duration)
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
