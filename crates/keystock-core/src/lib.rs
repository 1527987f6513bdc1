//! # keystock-core
//!
//! Core crate for KeyStock. Contains the configuration schema, typed
//! identifiers, the pool key type, the mirror store trait, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other KeyStock crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
