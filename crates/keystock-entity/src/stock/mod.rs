//! Pool-level stock summaries and mirror drift reports.

pub mod status;

pub use status::{PoolStatus, PoolSummary};
