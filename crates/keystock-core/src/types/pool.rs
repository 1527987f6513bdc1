//! The (program, duration) pool key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one pool of keys.
///
/// Instances are only produced by
/// [`InventoryConfig::pool`](crate::config::InventoryConfig::pool) and
/// [`InventoryConfig::all_pools`](crate::config::InventoryConfig::all_pools),
/// so both halves are always members of the configured vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    program: String,
    duration: String,
}

impl PoolKey {
    pub(crate) fn new(program: String, duration: String) -> Self {
        Self { program, duration }
    }

    /// The program half of the key.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The duration half of the key.
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// File name of this pool's mirror, `<program>_<duration>.txt`.
    pub fn mirror_file_name(&self) -> String {
        format!("{}_{}.txt", self.program, self.duration)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.program, self.duration)
    }
}
