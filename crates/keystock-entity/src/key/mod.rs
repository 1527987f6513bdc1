//! License key entities.

pub mod model;
pub mod outcome;

pub use model::{ClaimedKey, LicenseKey};
pub use outcome::{ClaimOutcome, InsertOutcome};
