//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystock_core::types::{KeyId, PrincipalId};
use keystock_entity::key::ClaimedKey;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Database reachability.
    pub database: String,
    /// Mirror directory usability.
    pub mirror: String,
}

/// Unclaimed count of one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCountResponse {
    /// Program.
    pub program: String,
    /// Duration.
    pub duration: String,
    /// Keys in stock.
    pub unclaimed: i64,
}

/// A key handed out by an allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedKeyResponse {
    /// Key identity.
    pub id: KeyId,
    /// Program.
    pub program: String,
    /// Duration.
    pub duration: String,
    /// The key value to deliver to the recipient.
    pub key: String,
    /// Allocating principal.
    pub allocated_by: PrincipalId,
    /// Receiving principal.
    pub recipient_id: PrincipalId,
    /// Claim time.
    pub claimed_at: DateTime<Utc>,
}

impl From<ClaimedKey> for AllocatedKeyResponse {
    fn from(key: ClaimedKey) -> Self {
        Self {
            id: key.id,
            program: key.program,
            duration: key.duration,
            key: key.value,
            allocated_by: key.claimed_by,
            recipient_id: key.claimed_for,
            claimed_at: key.claimed_at,
        }
    }
}

/// Result of a grant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    /// Principal granted.
    pub principal: PrincipalId,
    /// Program granted.
    pub program: String,
    /// Whether a new grant was stored.
    pub created: bool,
}

/// Result of a revoke request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    /// Principal revoked.
    pub principal: PrincipalId,
    /// Program revoked.
    pub program: String,
    /// Whether a stored grant was removed.
    pub removed: bool,
    /// Whether the principal can still operate on any program.
    pub still_has_any_access: bool,
}
