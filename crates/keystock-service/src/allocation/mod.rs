//! Allocation of single keys to recipients.

pub mod service;

pub use service::{Allocation, AllocationService};
