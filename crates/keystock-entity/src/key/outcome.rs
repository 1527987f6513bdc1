//! Outcomes of store-level key operations.
//!
//! Duplicates and empty pools are ordinary results of the inventory, so they
//! are variants here rather than `AppError`s.

use serde::{Deserialize, Serialize};

use keystock_core::types::KeyId;

use super::model::ClaimedKey;

/// Result of inserting one key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
    /// A new unclaimed row was created.
    Inserted(KeyId),
    /// The value already exists somewhere in the store.
    DuplicateRejected,
}

impl InsertOutcome {
    /// Whether a row was created.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Result of claiming one key from a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    /// A key was claimed.
    Claimed(ClaimedKey),
    /// The pool had no unclaimed key; nothing was mutated.
    PoolEmpty,
}
