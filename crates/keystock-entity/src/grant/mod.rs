//! Program access grant entities.

pub mod model;

pub use model::Grant;
