//! Allocation service: claim one key and reconcile the mirror.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keystock_core::config::InventoryConfig;
use keystock_core::error::AppError;
use keystock_core::traits::MirrorStore;
use keystock_core::types::{PrincipalId, display_key};
use keystock_database::repositories::KeyRepository;
use keystock_entity::key::{ClaimOutcome, ClaimedKey};

use crate::access::AccessService;
use crate::context::RequestContext;

/// Result of an allocation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allocation {
    /// A key was claimed for the recipient.
    Allocated(ClaimedKey),
    /// The pool had no unclaimed key.
    NoStock,
}

/// Hands out one key per request.
#[derive(Debug, Clone)]
pub struct AllocationService {
    /// Vocabularies used to validate the pool.
    inventory: Arc<InventoryConfig>,
    /// Authoritative key store.
    key_repo: Arc<KeyRepository>,
    /// Per-pool mirror files.
    mirror: Arc<dyn MirrorStore>,
    /// Access checks.
    access: Arc<AccessService>,
    /// Log key values unmasked.
    log_full_key: bool,
}

impl AllocationService {
    /// Creates a new allocation service.
    pub fn new(
        inventory: Arc<InventoryConfig>,
        key_repo: Arc<KeyRepository>,
        mirror: Arc<dyn MirrorStore>,
        access: Arc<AccessService>,
        log_full_key: bool,
    ) -> Self {
        Self {
            inventory,
            key_repo,
            mirror,
            access,
            log_full_key,
        }
    }

    /// Claims the oldest unclaimed key of the pool for `recipient`.
    ///
    /// Once the claim commits the key is spent: the mirror line is removed
    /// afterwards on a best-effort basis and a miss or failure there is only
    /// logged.
    pub async fn allocate(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
        recipient: PrincipalId,
    ) -> Result<Allocation, AppError> {
        let pool = self.inventory.pool(program, duration)?;
        self.access.require_access(ctx, pool.program()).await?;

        let key = match self.key_repo.claim_one(&pool, ctx.principal, recipient).await? {
            ClaimOutcome::Claimed(key) => key,
            ClaimOutcome::PoolEmpty => {
                info!(
                    principal = %ctx.principal,
                    recipient = %recipient,
                    pool = %pool,
                    "No stock left"
                );
                return Ok(Allocation::NoStock);
            }
        };

        let shown = display_key(&key.value, self.log_full_key);
        match self.mirror.remove_one(&pool, &key.value).await {
            Ok(true) => {}
            Ok(false) => warn!(
                pool = %pool,
                key = %shown,
                "MirrorInconsistency: claimed key was not in the mirror"
            ),
            Err(e) => warn!(
                pool = %pool,
                key = %shown,
                error = %e,
                "MirrorInconsistency: failed to remove claimed key from the mirror"
            ),
        }

        info!(
            principal = %ctx.principal,
            recipient = %recipient,
            pool = %pool,
            key_id = %key.id,
            key = %shown,
            "Key allocated"
        );
        Ok(Allocation::Allocated(key))
    }
}
