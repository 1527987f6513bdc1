//! Stock counts, pool clearing, and mirror status/rebuild.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keystock_core::config::InventoryConfig;
use keystock_core::error::AppError;
use keystock_core::traits::MirrorStore;
use keystock_core::types::PoolKey;
use keystock_database::repositories::KeyRepository;
use keystock_entity::stock::PoolStatus;

use super::drift::compare;
use crate::access::AccessService;
use crate::context::RequestContext;

/// Result of clearing a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    /// Unclaimed keys deleted.
    pub removed: u64,
}

/// Result of regenerating a pool's mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildSummary {
    /// Program half of the pool.
    pub program: String,
    /// Duration half of the pool.
    pub duration: String,
    /// Lines written to the new mirror.
    pub lines_written: usize,
    /// Whether the previous mirror differed from the store.
    pub drift_corrected: bool,
}

/// Stock counters for one pool, as listed by the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Program half of the pool.
    pub program: String,
    /// Duration half of the pool.
    pub duration: String,
    /// Keys still in stock.
    pub unclaimed: i64,
    /// Keys handed out.
    pub claimed: i64,
    /// Time of the most recent claim.
    pub last_claimed_at: Option<DateTime<Utc>>,
}

/// Read-mostly reporting over the key store, plus pool clearing.
#[derive(Debug, Clone)]
pub struct ReportService {
    /// Vocabularies used to validate pools.
    inventory: Arc<InventoryConfig>,
    /// Authoritative key store.
    key_repo: Arc<KeyRepository>,
    /// Per-pool mirror files.
    mirror: Arc<dyn MirrorStore>,
    /// Access checks.
    access: Arc<AccessService>,
}

impl ReportService {
    /// Creates a new report service.
    pub fn new(
        inventory: Arc<InventoryConfig>,
        key_repo: Arc<KeyRepository>,
        mirror: Arc<dyn MirrorStore>,
        access: Arc<AccessService>,
    ) -> Self {
        Self {
            inventory,
            key_repo,
            mirror,
            access,
        }
    }

    /// Number of unclaimed keys in the pool.
    pub async fn count_unclaimed(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
    ) -> Result<i64, AppError> {
        let pool = self.inventory.pool(program, duration)?;
        self.access.require_access(ctx, pool.program()).await?;
        self.key_repo.count_unclaimed(&pool).await
    }

    /// Deletes every unclaimed key of the pool and empties its mirror.
    ///
    /// Claimed keys are kept. Unlike the hot paths, a mirror failure here
    /// is returned to the caller.
    pub async fn clear_pool(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
    ) -> Result<ClearSummary, AppError> {
        self.access.require_owner(ctx)?;
        let pool = self.inventory.pool(program, duration)?;

        let removed = self.key_repo.delete_unclaimed(&pool).await?;
        self.mirror.wipe(&pool).await?;

        info!(
            owner = %ctx.principal,
            pool = %pool,
            removed,
            "Pool cleared"
        );
        Ok(ClearSummary { removed })
    }

    /// Store counters and mirror drift for one pool.
    pub async fn pool_status(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
    ) -> Result<PoolStatus, AppError> {
        self.access.require_owner(ctx)?;
        let pool = self.inventory.pool(program, duration)?;
        self.status_of(&pool).await
    }

    /// Regenerates the pool's mirror from the store's unclaimed values.
    pub async fn rebuild_mirror(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
    ) -> Result<RebuildSummary, AppError> {
        self.access.require_owner(ctx)?;
        let pool = self.inventory.pool(program, duration)?;

        let unclaimed = self.key_repo.list_unclaimed_values(&pool).await?;
        let drift_corrected = match self.mirror.read(&pool).await {
            Ok(lines) => compare(&unclaimed, &lines).detected(),
            Err(e) => {
                warn!(pool = %pool, error = %e, "Unreadable mirror, rebuilding");
                true
            }
        };

        self.mirror.rebuild(&pool, &unclaimed).await?;

        if drift_corrected {
            warn!(
                owner = %ctx.principal,
                pool = %pool,
                lines = unclaimed.len(),
                "Mirror drift corrected"
            );
        } else {
            info!(pool = %pool, lines = unclaimed.len(), "Mirror rebuilt");
        }

        Ok(RebuildSummary {
            program: pool.program().to_string(),
            duration: pool.duration().to_string(),
            lines_written: unclaimed.len(),
            drift_corrected,
        })
    }

    /// Counters for every configured pool.
    pub async fn stock_overview(&self, ctx: &RequestContext) -> Result<Vec<StockLevel>, AppError> {
        self.access.require_owner(ctx)?;

        let mut levels = Vec::new();
        for pool in self.inventory.all_pools() {
            let summary = self.key_repo.pool_summary(&pool).await?;
            levels.push(StockLevel {
                program: pool.program().to_string(),
                duration: pool.duration().to_string(),
                unclaimed: summary.unclaimed,
                claimed: summary.claimed,
                last_claimed_at: summary.last_claimed_at,
            });
        }
        Ok(levels)
    }

    async fn status_of(&self, pool: &PoolKey) -> Result<PoolStatus, AppError> {
        let summary = self.key_repo.pool_summary(pool).await?;
        let unclaimed = self.key_repo.list_unclaimed_values(pool).await?;
        let lines = self.mirror.read(pool).await?;
        let drift = compare(&unclaimed, &lines);

        if drift.detected() {
            warn!(
                pool = %pool,
                missing = drift.missing,
                stale = drift.stale,
                "Mirror drift detected"
            );
        }

        Ok(PoolStatus {
            program: pool.program().to_string(),
            duration: pool.duration().to_string(),
            unclaimed: summary.unclaimed,
            claimed: summary.claimed,
            last_claimed_at: summary.last_claimed_at,
            mirror_lines: lines.len() as i64,
            missing_from_mirror: drift.missing as i64,
            stale_in_mirror: drift.stale as i64,
            drift_detected: drift.detected(),
        })
    }
}
