//! Comparison of a pool's unclaimed values with its mirror lines.

use std::collections::HashSet;

/// Differences between the store and a mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Drift {
    /// Unclaimed values with no mirror line.
    pub missing: usize,
    /// Mirror lines that do not match a distinct unclaimed value, including
    /// repeated lines.
    pub stale: usize,
}

impl Drift {
    /// Whether the mirror differs from the store.
    pub fn detected(&self) -> bool {
        self.missing > 0 || self.stale > 0
    }
}

/// Compare unclaimed store values with mirror lines. Order is ignored.
pub fn compare(unclaimed: &[String], mirror: &[String]) -> Drift {
    let expected: HashSet<&str> = unclaimed.iter().map(String::as_str).collect();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut stale = 0;

    for line in mirror {
        if expected.contains(line.as_str()) && matched.insert(line.as_str()) {
            continue;
        }
        stale += 1;
    }

    Drift {
        missing: expected.len() - matched.len(),
        stale,
    }
}
