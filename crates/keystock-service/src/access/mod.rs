//! Access control: owner bypass and per-program grants.

pub mod service;

pub use service::{AccessService, AccessSummary, RevokeOutcome};
