//! Stock reporting, clearing, and mirror drift repair.

pub mod drift;
pub mod service;

pub use drift::{Drift, compare};
pub use service::{ClearSummary, RebuildSummary, ReportService, StockLevel};
