//! Access checks and grant management.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use keystock_core::config::InventoryConfig;
use keystock_core::error::AppError;
use keystock_core::types::PrincipalId;
use keystock_database::repositories::GrantRepository;
use keystock_entity::grant::Grant;

use crate::context::RequestContext;

/// Result of revoking a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeOutcome {
    /// Whether a stored grant was removed.
    pub removed: bool,
    /// Whether the principal can still operate on any program.
    pub still_has_any_access: bool,
}

/// Per-program access of one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSummary {
    /// The principal described.
    pub principal: PrincipalId,
    /// Whether the principal is an owner.
    pub is_owner: bool,
    /// Whether the principal can operate on at least one program.
    pub has_any_access: bool,
    /// Access per configured program.
    pub programs: BTreeMap<String, bool>,
}

/// Answers who may operate on which program and manages grants.
#[derive(Debug, Clone)]
pub struct AccessService {
    /// Vocabularies and owner set.
    inventory: Arc<InventoryConfig>,
    /// Grant repository.
    grant_repo: Arc<GrantRepository>,
}

impl AccessService {
    /// Creates a new access service.
    pub fn new(inventory: Arc<InventoryConfig>, grant_repo: Arc<GrantRepository>) -> Self {
        Self {
            inventory,
            grant_repo,
        }
    }

    /// Builds the request context for an acting principal.
    pub fn context(&self, principal: PrincipalId) -> RequestContext {
        RequestContext::new(principal, self.inventory.is_owner(principal))
    }

    /// Whether the principal may operate on the program: owners always may,
    /// everyone else needs a stored grant.
    pub async fn has_access(&self, principal: PrincipalId, program: &str) -> Result<bool, AppError> {
        let program = self.inventory.program(program)?;
        if self.inventory.is_owner(principal) {
            return Ok(true);
        }
        self.grant_repo.exists(principal, &program).await
    }

    /// Whether the principal may operate on at least one program.
    pub async fn has_any_access(&self, principal: PrincipalId) -> Result<bool, AppError> {
        if self.inventory.is_owner(principal) {
            return Ok(true);
        }
        self.grant_repo.has_any(principal).await
    }

    /// Fails with `AccessDenied` unless the acting principal may operate on
    /// the program.
    pub async fn require_access(&self, ctx: &RequestContext, program: &str) -> Result<(), AppError> {
        let program = self.inventory.program(program)?;
        if ctx.is_owner || self.grant_repo.exists(ctx.principal, &program).await? {
            return Ok(());
        }
        warn!(
            principal = %ctx.principal,
            program = %program,
            "Access denied"
        );
        Err(AppError::access_denied(format!(
            "Principal {} has no access to program '{program}'",
            ctx.principal
        )))
    }

    /// Fails with `AccessDenied` unless the acting principal is an owner.
    pub fn require_owner(&self, ctx: &RequestContext) -> Result<(), AppError> {
        if ctx.is_owner {
            Ok(())
        } else {
            warn!(principal = %ctx.principal, "Owner-only operation refused");
            Err(AppError::access_denied("Only owners may perform this operation"))
        }
    }

    /// Grants a principal access to a program. Returns `false` if the grant
    /// already existed.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        principal: PrincipalId,
        program: &str,
    ) -> Result<bool, AppError> {
        self.require_owner(ctx)?;
        let program = self.inventory.program(program)?;

        let created = self
            .grant_repo
            .grant(principal, &program, Some(ctx.principal))
            .await?;

        info!(
            owner = %ctx.principal,
            principal = %principal,
            program = %program,
            created,
            "Grant recorded"
        );
        Ok(created)
    }

    /// Revokes a principal's access to a program.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        principal: PrincipalId,
        program: &str,
    ) -> Result<RevokeOutcome, AppError> {
        self.require_owner(ctx)?;
        let program = self.inventory.program(program)?;

        let removed = self.grant_repo.revoke(principal, &program).await?;
        let still_has_any_access = self.has_any_access(principal).await?;

        info!(
            owner = %ctx.principal,
            principal = %principal,
            program = %program,
            removed,
            still_has_any_access,
            "Grant revoked"
        );
        Ok(RevokeOutcome {
            removed,
            still_has_any_access,
        })
    }

    /// Lists stored grants, for one principal or for everyone.
    pub async fn list_grants(
        &self,
        ctx: &RequestContext,
        principal: Option<PrincipalId>,
    ) -> Result<Vec<Grant>, AppError> {
        self.require_owner(ctx)?;
        match principal {
            Some(p) => self.grant_repo.list_for_principal(p).await,
            None => self.grant_repo.list_all().await,
        }
    }

    /// Describes a principal's access to every configured program.
    ///
    /// Principals may inspect themselves; owners may inspect anyone.
    pub async fn summary(
        &self,
        ctx: &RequestContext,
        principal: PrincipalId,
    ) -> Result<AccessSummary, AppError> {
        if ctx.principal != principal {
            self.require_owner(ctx)?;
        }

        let is_owner = self.inventory.is_owner(principal);
        let granted: Vec<String> = if is_owner {
            Vec::new()
        } else {
            self.grant_repo
                .list_for_principal(principal)
                .await?
                .into_iter()
                .map(|g| g.program)
                .collect()
        };

        let programs: BTreeMap<String, bool> = self
            .inventory
            .programs
            .iter()
            .map(|p| (p.clone(), is_owner || granted.contains(p)))
            .collect();
        let has_any_access = is_owner || !granted.is_empty();

        Ok(AccessSummary {
            principal,
            is_owner,
            has_any_access,
            programs,
        })
    }
}
