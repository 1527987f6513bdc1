//! License key entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keystock_core::types::{KeyId, PrincipalId};

/// One row of the `license_keys` table.
///
/// A key is unclaimed while `claimed_at` is `None`. Claiming sets
/// `claimed_by`, `claimed_for` and `claimed_at` together, exactly once; no
/// operation ever clears them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LicenseKey {
    /// Surrogate identity, ascending in insertion order.
    pub id: KeyId,
    /// Program the key belongs to.
    pub program: String,
    /// Duration the key belongs to.
    pub duration: String,
    /// The credential string, unique across the whole store.
    pub value: String,
    /// Principal that allocated the key.
    pub claimed_by: Option<PrincipalId>,
    /// Principal the key was allocated for.
    pub claimed_for: Option<PrincipalId>,
    /// When the key was claimed (None = still in stock).
    pub claimed_at: Option<DateTime<Utc>>,
    /// When the key was imported.
    pub created_at: DateTime<Utc>,
}

impl LicenseKey {
    /// Whether the key has left the pool.
    pub fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }

    /// View a claimed row as a [`ClaimedKey`]. Returns `None` for a row that
    /// is still in stock or whose claim columns are incomplete.
    pub fn into_claimed(self) -> Option<ClaimedKey> {
        Some(ClaimedKey {
            id: self.id,
            program: self.program,
            duration: self.duration,
            value: self.value,
            claimed_by: self.claimed_by?,
            claimed_for: self.claimed_for?,
            claimed_at: self.claimed_at?,
        })
    }
}

/// A key handed out by a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedKey {
    /// Key identity.
    pub id: KeyId,
    /// Program the key belongs to.
    pub program: String,
    /// Duration the key belongs to.
    pub duration: String,
    /// The credential string.
    pub value: String,
    /// Allocating principal.
    pub claimed_by: PrincipalId,
    /// Receiving principal.
    pub claimed_for: PrincipalId,
    /// Claim time.
    pub claimed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(claimed: bool) -> LicenseKey {
        LicenseKey {
            id: KeyId(1),
            program: "temp".into(),
            duration: "day".into(),
            value: "AAAA-BBBB".into(),
            claimed_by: claimed.then_some(PrincipalId(10)),
            claimed_for: claimed.then_some(PrincipalId(20)),
            claimed_at: claimed.then(Utc::now),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unclaimed_row_has_no_claim_view() {
        let key = row(false);
        assert!(!key.is_claimed());
        assert!(key.into_claimed().is_none());
    }

    #[test]
    fn test_claimed_row_converts() {
        let claimed = row(true).into_claimed().unwrap();
        assert_eq!(claimed.value, "AAAA-BBBB");
        assert_eq!(claimed.claimed_by, PrincipalId(10));
        assert_eq!(claimed.claimed_for, PrincipalId(20));
    }
}
