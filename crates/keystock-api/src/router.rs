//! Route definitions for the KeyStock HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::dto::request::MAX_IMPORT_TEXT;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    let api_routes = Router::new()
        .merge(stock_routes())
        .merge(access_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_IMPORT_TEXT * 2))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Stock counts, import, allocation, clearing, and mirror repair
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::stock::overview))
        .route(
            "/stock/{program}/{duration}",
            get(handlers::stock::count).delete(handlers::stock::clear),
        )
        .route(
            "/stock/{program}/{duration}/import",
            post(handlers::stock::import),
        )
        .route(
            "/stock/{program}/{duration}/allocate",
            post(handlers::stock::allocate),
        )
        .route(
            "/stock/{program}/{duration}/status",
            get(handlers::stock::status),
        )
        .route(
            "/stock/{program}/{duration}/mirror/rebuild",
            post(handlers::stock::rebuild_mirror),
        )
}

/// Access lookups and grant management
fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/access/{principal}", get(handlers::access::access_summary))
        .route(
            "/grants/{principal}/{program}",
            put(handlers::access::grant).delete(handlers::access::revoke),
        )
        .route("/grants", get(handlers::access::list_grants))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
