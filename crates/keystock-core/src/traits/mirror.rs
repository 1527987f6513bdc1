//! Mirror store trait for the per-pool text projection of unclaimed keys.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::pool::PoolKey;

/// A best-effort, human-readable projection of each pool's unclaimed keys.
///
/// The database is authoritative. Implementations hold one line per key
/// value and never need to be transactional with the store; callers decide
/// which failures to swallow.
#[async_trait]
pub trait MirrorStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append `values` in order, one per line. An empty slice is a no-op and
    /// must not create or touch the file.
    async fn append(&self, pool: &PoolKey, values: &[String]) -> AppResult<()>;

    /// Remove the first line whose trimmed content equals `value`, leaving
    /// every other line untouched, line terminators included. Returns
    /// `false` if no line matched.
    async fn remove_one(&self, pool: &PoolKey, value: &str) -> AppResult<bool>;

    /// Truncate the pool's mirror to empty, creating it if missing.
    async fn wipe(&self, pool: &PoolKey) -> AppResult<()>;

    /// Read all non-empty trimmed lines in file order.
    async fn read(&self, pool: &PoolKey) -> AppResult<Vec<String>>;

    /// Replace the pool's mirror with exactly `values`, in order.
    async fn rebuild(&self, pool: &PoolKey, values: &[String]) -> AppResult<()>;

    /// Check that the mirror location is usable.
    async fn health_check(&self) -> AppResult<bool>;
}
