//! License key repository: the authoritative key store.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use sqlx::SqlitePool;
use tracing::debug;

use keystock_core::error::{AppError, ErrorKind};
use keystock_core::result::AppResult;
use keystock_core::types::{PoolKey, PrincipalId};
use keystock_entity::key::{ClaimOutcome, InsertOutcome, LicenseKey};
use keystock_entity::stock::PoolSummary;

/// Marks the oldest unclaimed key of a pool as claimed and returns the row.
///
/// Runs inside `BEGIN IMMEDIATE`, so the candidate selection and the update
/// execute while this connection holds the database write lock.
const CLAIM_SQL: &str = "\
    UPDATE license_keys \
    SET claimed_by = ?1, claimed_for = ?2, claimed_at = ?3 \
    WHERE id = ( \
        SELECT id FROM license_keys \
        WHERE program = ?4 AND duration = ?5 AND claimed_at IS NULL \
        ORDER BY id ASC LIMIT 1 \
    ) AND claimed_at IS NULL \
    RETURNING *";

/// Repository for license key rows.
#[derive(Debug, Clone)]
pub struct KeyRepository {
    pool: SqlitePool,
}

impl KeyRepository {
    /// Create a new key repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one unclaimed key.
    ///
    /// Returns [`InsertOutcome::DuplicateRejected`] if the value already
    /// exists in any pool.
    pub async fn insert(&self, pool: &PoolKey, value: &str) -> AppResult<InsertOutcome> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e))?;
        insert_on(&mut conn, pool, value, Utc::now()).await
    }

    /// Insert many keys in one transaction, returning one outcome per value
    /// in input order.
    pub async fn insert_batch(
        &self,
        pool: &PoolKey,
        values: &[String],
    ) -> AppResult<Vec<InsertOutcome>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin import", e))?;

        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(values.len());
        for value in values {
            outcomes.push(insert_on(&mut tx, pool, value, now).await?);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit import", e))?;

        Ok(outcomes)
    }

    /// Count the unclaimed keys of a pool.
    pub async fn count_unclaimed(&self, pool: &PoolKey) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM license_keys \
             WHERE program = ?1 AND duration = ?2 AND claimed_at IS NULL",
        )
        .bind(pool.program())
        .bind(pool.duration())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count stock", e))
    }

    /// Claim the oldest unclaimed key of a pool for `recipient`.
    ///
    /// The claim is a single `UPDATE … RETURNING` inside an immediate
    /// transaction. Concurrent claimers queue on the SQLite write lock (up
    /// to the configured busy timeout), so no key is ever returned twice.
    /// An empty pool yields [`ClaimOutcome::PoolEmpty`] with no mutation.
    pub async fn claim_one(
        &self,
        pool: &PoolKey,
        allocator: PrincipalId,
        recipient: PrincipalId,
    ) -> AppResult<ClaimOutcome> {
        // Dropping the transaction (an error or a cancelled caller) rolls
        // it back and releases the write lock.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock key store", e))?;

        let row = sqlx::query_as::<_, LicenseKey>(CLAIM_SQL)
            .bind(allocator)
            .bind(recipient)
            .bind(Utc::now())
            .bind(pool.program())
            .bind(pool.duration())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim key", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit claim", e))?;

        match row {
            None => {
                debug!(pool = %pool, "Claim found no unclaimed key");
                Ok(ClaimOutcome::PoolEmpty)
            }
            Some(row) => row
                .into_claimed()
                .map(ClaimOutcome::Claimed)
                .ok_or_else(|| AppError::internal("Claimed row is missing claim columns")),
        }
    }

    /// Delete every unclaimed key of a pool, returning how many were removed.
    /// Claimed keys are never touched.
    pub async fn delete_unclaimed(&self, pool: &PoolKey) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM license_keys \
             WHERE program = ?1 AND duration = ?2 AND claimed_at IS NULL",
        )
        .bind(pool.program())
        .bind(pool.duration())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear stock", e))?;
        Ok(result.rows_affected())
    }

    /// All unclaimed values of a pool in insertion order.
    pub async fn list_unclaimed_values(&self, pool: &PoolKey) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM license_keys \
             WHERE program = ?1 AND duration = ?2 AND claimed_at IS NULL \
             ORDER BY id ASC",
        )
        .bind(pool.program())
        .bind(pool.duration())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list stock", e))
    }

    /// Unclaimed/claimed counters and last claim time of a pool.
    pub async fn pool_summary(&self, pool: &PoolKey) -> AppResult<PoolSummary> {
        let (unclaimed, claimed, last_claimed_at) =
            sqlx::query_as::<_, (i64, i64, Option<DateTime<Utc>>)>(
                "SELECT \
                    COALESCE(SUM(CASE WHEN claimed_at IS NULL THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN claimed_at IS NOT NULL THEN 1 ELSE 0 END), 0), \
                    MAX(claimed_at) \
                 FROM license_keys WHERE program = ?1 AND duration = ?2",
            )
            .bind(pool.program())
            .bind(pool.duration())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to summarize pool", e)
            })?;

        Ok(PoolSummary {
            unclaimed,
            claimed,
            last_claimed_at,
        })
    }

    /// Find a key by its value, in any pool.
    pub async fn find_by_value(&self, value: &str) -> AppResult<Option<LicenseKey>> {
        sqlx::query_as::<_, LicenseKey>("SELECT * FROM license_keys WHERE value = ?1")
            .bind(value.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find key", e))
    }
}

/// Insert one key on an existing connection or transaction.
async fn insert_on(
    conn: &mut SqliteConnection,
    pool: &PoolKey,
    value: &str,
    now: DateTime<Utc>,
) -> AppResult<InsertOutcome> {
    if value.trim().is_empty() || value.trim() != value {
        return Err(AppError::validation(
            "Key values must be non-empty and carry no surrounding whitespace",
        ));
    }

    let result = sqlx::query(
        "INSERT INTO license_keys (program, duration, value, created_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (value) DO NOTHING",
    )
    .bind(pool.program())
    .bind(pool.duration())
    .bind(value)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert key", e))?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::DuplicateRejected)
    } else {
        Ok(InsertOutcome::Inserted(result.last_insert_rowid().into()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use keystock_core::config::{DatabaseConfig, InventoryConfig};
    use keystock_entity::key::ClaimedKey;

    use super::*;
    use crate::connection::DatabasePool;
    use crate::migration::run_migrations;

    async fn setup() -> (tempfile::TempDir, KeyRepository) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("keys.db").display()),
            ..Default::default()
        };
        let db = DatabasePool::connect(&config).await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        (dir, KeyRepository::new(db.into_pool()))
    }

    fn pool(program: &str, duration: &str) -> PoolKey {
        InventoryConfig::default().pool(program, duration).unwrap()
    }

    fn claimed(outcome: ClaimOutcome) -> ClaimedKey {
        match outcome {
            ClaimOutcome::Claimed(key) => key,
            ClaimOutcome::PoolEmpty => panic!("expected a claimed key"),
        }
    }

    #[tokio::test]
    async fn test_uniqueness_is_global() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        let life = pool("perm", "lifetime");

        assert!(repo.insert(&day, "KEY-1").await.unwrap().is_inserted());
        assert_eq!(
            repo.insert(&life, "KEY-1").await.unwrap(),
            InsertOutcome::DuplicateRejected
        );
        assert_eq!(repo.count_unclaimed(&day).await.unwrap(), 1);
        assert_eq!(repo.count_unclaimed(&life).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_reports_per_value() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        repo.insert(&day, "B").await.unwrap();

        let outcomes = repo
            .insert_batch(&day, &["A".into(), "B".into(), "C".into()])
            .await
            .unwrap();
        assert!(outcomes[0].is_inserted());
        assert_eq!(outcomes[1], InsertOutcome::DuplicateRejected);
        assert!(outcomes[2].is_inserted());
        assert_eq!(repo.count_unclaimed(&day).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rejects_untrimmed_value() {
        let (_dir, repo) = setup().await;
        let err = repo.insert(&pool("temp", "day"), " X ").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_claim_is_fifo_and_records_parties() {
        let (_dir, repo) = setup().await;
        let week = pool("temp", "week");
        repo.insert_batch(&week, &["first".into(), "second".into()])
            .await
            .unwrap();

        let key = claimed(
            repo.claim_one(&week, PrincipalId(1), PrincipalId(2))
                .await
                .unwrap(),
        );
        assert_eq!(key.value, "first");
        assert_eq!(key.claimed_by, PrincipalId(1));
        assert_eq!(key.claimed_for, PrincipalId(2));

        let row = repo.find_by_value("first").await.unwrap().unwrap();
        assert!(row.is_claimed());
        assert_eq!(repo.count_unclaimed(&week).await.unwrap(), 1);

        let key = claimed(
            repo.claim_one(&week, PrincipalId(1), PrincipalId(3))
                .await
                .unwrap(),
        );
        assert_eq!(key.value, "second");
    }

    #[tokio::test]
    async fn test_claim_on_empty_pool_mutates_nothing() {
        let (_dir, repo) = setup().await;
        let month = pool("private", "month");
        repo.insert(&pool("private", "day"), "other").await.unwrap();

        let outcome = repo
            .claim_one(&month, PrincipalId(1), PrincipalId(2))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::PoolEmpty);
        assert_eq!(
            repo.count_unclaimed(&pool("private", "day")).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_claims_are_distinct() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        let values: Vec<String> = (0..12).map(|i| format!("K-{i:02}")).collect();
        repo.insert_batch(&day, &values).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..16 {
            let repo = repo.clone();
            let day = day.clone();
            tasks.spawn(async move {
                repo.claim_one(&day, PrincipalId(1), PrincipalId(100 + i))
                    .await
                    .unwrap()
            });
        }

        let mut seen = HashSet::new();
        let mut empty = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                ClaimOutcome::Claimed(key) => assert!(seen.insert(key.value)),
                ClaimOutcome::PoolEmpty => empty += 1,
            }
        }
        assert_eq!(seen.len(), 12);
        assert_eq!(empty, 4);
        assert_eq!(repo.count_unclaimed(&day).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_claim_releases_write_lock() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        repo.insert_batch(&day, &["K-1".into(), "K-2".into()])
            .await
            .unwrap();

        let mut holder = repo.pool.begin_with("BEGIN IMMEDIATE").await.unwrap();
        sqlx::query("UPDATE license_keys SET created_at = created_at WHERE value = 'K-1'")
            .execute(&mut *holder)
            .await
            .unwrap();

        let waiting = tokio::time::timeout(
            Duration::from_millis(200),
            repo.claim_one(&day, PrincipalId(1), PrincipalId(2)),
        )
        .await;
        assert!(waiting.is_err(), "claim should still be waiting for the lock");

        holder.commit().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(repo.insert(&day, "K-3").await.unwrap().is_inserted());
        let key = claimed(
            repo.claim_one(&day, PrincipalId(1), PrincipalId(2))
                .await
                .unwrap(),
        );
        assert_eq!(key.value, "K-1");
        assert_eq!(repo.count_unclaimed(&day).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_unclaimed_keeps_claimed_rows() {
        let (_dir, repo) = setup().await;
        let day = pool("perm", "day");
        let values: Vec<String> = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        repo.insert_batch(&day, &values).await.unwrap();
        repo.claim_one(&day, PrincipalId(1), PrincipalId(2))
            .await
            .unwrap();
        repo.claim_one(&day, PrincipalId(1), PrincipalId(3))
            .await
            .unwrap();

        assert_eq!(repo.delete_unclaimed(&day).await.unwrap(), 3);

        let summary = repo.pool_summary(&day).await.unwrap();
        assert_eq!(summary.unclaimed, 0);
        assert_eq!(summary.claimed, 2);
        assert!(summary.last_claimed_at.is_some());
        assert!(repo.find_by_value("a").await.unwrap().is_some());
        assert!(repo.find_by_value("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claimed_rows_cannot_be_reclaimed_or_deleted_directly() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        repo.insert(&day, "only").await.unwrap();
        repo.claim_one(&day, PrincipalId(1), PrincipalId(2))
            .await
            .unwrap();

        let reset = sqlx::query("UPDATE license_keys SET claimed_at = NULL, claimed_by = NULL, claimed_for = NULL")
            .execute(&repo.pool)
            .await;
        assert!(reset.is_err());

        let delete = sqlx::query("DELETE FROM license_keys").execute(&repo.pool).await;
        assert!(delete.is_err());

        assert_eq!(repo.count_unclaimed(&day).await.unwrap(), 0);
        assert_eq!(
            repo.claim_one(&day, PrincipalId(1), PrincipalId(2))
                .await
                .unwrap(),
            ClaimOutcome::PoolEmpty
        );
    }

    #[tokio::test]
    async fn test_list_unclaimed_in_insertion_order() {
        let (_dir, repo) = setup().await;
        let day = pool("temp", "day");
        repo.insert_batch(&day, &["z".into(), "a".into(), "m".into()])
            .await
            .unwrap();
        repo.claim_one(&day, PrincipalId(1), PrincipalId(2))
            .await
            .unwrap();
        assert_eq!(
            repo.list_unclaimed_values(&day).await.unwrap(),
            vec!["a".to_string(), "m".to_string()]
        );
    }
}
