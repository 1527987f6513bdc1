//! Grant repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use keystock_core::error::{AppError, ErrorKind};
use keystock_core::result::AppResult;
use keystock_core::types::PrincipalId;
use keystock_entity::grant::Grant;

/// Repository for per-program access grants.
#[derive(Debug, Clone)]
pub struct GrantRepository {
    pool: SqlitePool,
}

impl GrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a grant. Returns `false` if the grant already existed.
    pub async fn grant(
        &self,
        principal: PrincipalId,
        program: &str,
        granted_by: Option<PrincipalId>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO grants (principal_id, program, granted_by, created_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (principal_id, program) DO NOTHING",
        )
        .bind(principal)
        .bind(program)
        .bind(granted_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create grant", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a grant. Returns `false` if there was nothing to remove.
    pub async fn revoke(&self, principal: PrincipalId, program: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM grants WHERE principal_id = ?1 AND program = ?2")
            .bind(principal)
            .bind(program)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke grant", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the principal holds a stored grant for the program.
    pub async fn exists(&self, principal: PrincipalId, program: &str) -> AppResult<bool> {
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM grants WHERE principal_id = ?1 AND program = ?2 LIMIT 1",
        )
        .bind(principal)
        .bind(program)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check grant", e))?;
        Ok(row.is_some())
    }

    /// Whether the principal holds a stored grant for any program.
    pub async fn has_any(&self, principal: PrincipalId) -> AppResult<bool> {
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM grants WHERE principal_id = ?1 LIMIT 1",
        )
        .bind(principal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check grants", e))?;
        Ok(row.is_some())
    }

    /// Grants held by one principal, ordered by program.
    pub async fn list_for_principal(&self, principal: PrincipalId) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>(
            "SELECT * FROM grants WHERE principal_id = ?1 ORDER BY program ASC",
        )
        .bind(principal)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list grants", e))
    }

    /// Every stored grant, ordered by principal then program.
    pub async fn list_all(&self) -> AppResult<Vec<Grant>> {
        sqlx::query_as::<_, Grant>("SELECT * FROM grants ORDER BY principal_id ASC, program ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list grants", e))
    }
}
