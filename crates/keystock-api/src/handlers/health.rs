//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database_ok = state.db.health_check().await.unwrap_or(false);
    let mirror_ok = state.mirror.health_check().await.unwrap_or(false);

    let healthy = database_ok && mirror_ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(database_ok, mirror_ok, "Health check degraded");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if database_ok { "connected" } else { "unreachable" }.to_string(),
            mirror: if mirror_ok { "available" } else { "unavailable" }.to_string(),
        })),
    )
}
