//! # keystock-entity
//!
//! Domain entity models for KeyStock. Database entities derive
//! `sqlx::FromRow`; the remaining types are the value objects and outcome
//! enums returned by the store and the services.

pub mod grant;
pub mod key;
pub mod stock;
