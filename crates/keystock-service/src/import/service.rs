//! Import service: parse, insert, then mirror the accepted values.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use keystock_core::config::InventoryConfig;
use keystock_core::error::AppError;
use keystock_core::traits::MirrorStore;
use keystock_database::repositories::KeyRepository;
use keystock_entity::key::InsertOutcome;

use super::parser::parse_keys;
use crate::access::AccessService;
use crate::context::RequestContext;

/// Counters reported by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Values stored as new unclaimed keys.
    pub added: u64,
    /// Values rejected because they already exist in the store.
    pub duplicates: u64,
}

/// Imports key values into a pool.
#[derive(Debug, Clone)]
pub struct ImportService {
    /// Vocabularies used to validate the pool.
    inventory: Arc<InventoryConfig>,
    /// Authoritative key store.
    key_repo: Arc<KeyRepository>,
    /// Per-pool mirror files.
    mirror: Arc<dyn MirrorStore>,
    /// Access checks.
    access: Arc<AccessService>,
}

impl ImportService {
    /// Creates a new import service.
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

    /// Imports every key value found in `text` into the pool.
    ///
    /// Values already present anywhere in the store are counted as
    /// duplicates. Only newly stored values are appended to the mirror, in
    /// input order; a failed append is logged and does not fail the import.
    pub async fn import_text(
        &self,
        ctx: &RequestContext,
        program: &str,
        duration: &str,
        text: &str,
    ) -> Result<ImportSummary, AppError> {
        let pool = self.inventory.pool(program, duration)?;
        self.access.require_access(ctx, pool.program()).await?;

        let values = parse_keys(text);
        if values.is_empty() {
            debug!(pool = %pool, "Import text contained no keys");
            return Ok(ImportSummary::default());
        }

        let outcomes = self.key_repo.insert_batch(&pool, &values).await?;

        let mut summary = ImportSummary::default();
        let mut accepted = Vec::with_capacity(values.len());
        for (value, outcome) in values.into_iter().zip(outcomes) {
            match outcome {
                InsertOutcome::Inserted(_) => {
                    summary.added += 1;
                    accepted.push(value);
                }
                InsertOutcome::DuplicateRejected => summary.duplicates += 1,
            }
        }

        if let Err(e) = self.mirror.append(&pool, &accepted).await {
            warn!(
                pool = %pool,
                lines = accepted.len(),
                error = %e,
                "MirrorInconsistency: failed to append imported keys"
            );
        }

        info!(
            principal = %ctx.principal,
            pool = %pool,
            added = summary.added,
            duplicates = summary.duplicates,
            "Keys imported"
        );
        Ok(summary)
    }
}
