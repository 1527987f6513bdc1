//! Bulk import of key values from raw text.

pub mod parser;
pub mod service;

pub use parser::parse_keys;
pub use service::{ImportService, ImportSummary};
