//! # keystock-api
//!
//! HTTP API layer for KeyStock built on Axum.
//!
//! Exposes the inventory operations to the chat bot front end: stock
//! import, allocation, counts, clearing, mirror repair, and grant
//! management. The caller is trusted to have authenticated the acting
//! principal and passes it in the `X-Principal-Id` header.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
