//! Pool summary and drift status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-side counters for one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    /// Keys still in stock.
    pub unclaimed: i64,
    /// Keys handed out.
    pub claimed: i64,
    /// Time of the most recent claim.
    pub last_claimed_at: Option<DateTime<Utc>>,
}

/// Store and mirror state of one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
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
    /// Non-empty lines in the mirror file.
    pub mirror_lines: i64,
    /// Unclaimed values absent from the mirror.
    pub missing_from_mirror: i64,
    /// Mirror lines that are not unclaimed values (claimed, deleted, or
    /// duplicated lines).
    pub stale_in_mirror: i64,
    /// Whether the mirror differs from the store.
    pub drift_detected: bool,
}

impl PoolStatus {
    /// Share of the pool's keys already handed out, in percent.
    pub fn usage_percent(&self) -> f64 {
        let total = self.unclaimed + self.claimed;
        if total == 0 {
            0.0
        } else {
            self.claimed as f64 * 100.0 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percent() {
        let status = PoolStatus {
            program: "temp".into(),
            duration: "day".into(),
            unclaimed: 3,
            claimed: 1,
            last_claimed_at: None,
            mirror_lines: 3,
            missing_from_mirror: 0,
            stale_in_mirror: 0,
            drift_detected: false,
        };
        assert!((status.usage_percent() - 25.0).abs() < f64::EPSILON);
    }
}
