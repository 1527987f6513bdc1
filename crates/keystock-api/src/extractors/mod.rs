//! Custom Axum extractors.

pub mod path;
pub mod principal;

pub use principal::Principal;
