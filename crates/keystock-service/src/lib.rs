//! # keystock-service
//!
//! Business logic service layer for KeyStock. Each service orchestrates the
//! key and grant repositories and the mirror store to implement one group
//! of inventory use cases.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references.

pub mod access;
pub mod allocation;
pub mod context;
pub mod import;
pub mod report;

pub use access::{AccessService, AccessSummary, RevokeOutcome};
pub use allocation::{Allocation, AllocationService};
pub use context::RequestContext;
pub use import::{ImportService, ImportSummary};
pub use report::{ClearSummary, RebuildSummary, ReportService, StockLevel};
