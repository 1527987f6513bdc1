//! Request context carrying the acting principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystock_core::types::PrincipalId;

/// Principal used by the local operator CLI when no principal is given.
pub const OPERATOR_PRINCIPAL: PrincipalId = PrincipalId(0);

/// Context for the current request.
///
/// Built by [`AccessService::context`](crate::AccessService::context) so the
/// owner flag always reflects the configured owner set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting principal.
    pub principal: PrincipalId,
    /// Whether the principal is an owner.
    pub is_owner: bool,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(principal: PrincipalId, is_owner: bool) -> Self {
        Self {
            principal,
            is_owner,
            request_time: Utc::now(),
        }
    }

    /// Context for the local operator, who has direct access to the
    /// database and is treated as an owner.
    pub fn operator() -> Self {
        Self::new(OPERATOR_PRINCIPAL, true)
    }
}
