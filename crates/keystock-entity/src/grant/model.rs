//! Grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keystock_core::types::PrincipalId;

/// Permission for a principal to operate on one program.
///
/// Keyed by `(principal_id, program)`. Owners never need a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Grant {
    /// Principal holding the grant.
    pub principal_id: PrincipalId,
    /// Program the grant covers.
    pub program: String,
    /// Owner who created the grant, if recorded.
    pub granted_by: Option<PrincipalId>,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}
