use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Freshness windows for the persisted mirror.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Persisted caches older than this are ignored on load.
    pub expiry_ms: u64,

    /// Loads older than this still adopt the cache but schedule a
    /// non-blocking background refresh.
    pub refresh_after_ms: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            expiry_ms: 24 * 60 * 60 * 1000,
            refresh_after_ms: 12 * 60 * 60 * 1000,
        }
    }
}

impl CachePolicy {
    pub fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }

    pub fn is_fresh(&self, age_ms: i64) -> bool {
        age_ms >= 0 && (age_ms as u64) < self.expiry_ms
    }

    pub fn is_borderline(&self, age_ms: i64) -> bool {
        self.is_fresh(age_ms) && (age_ms as u64) >= self.refresh_after_ms
    }
}
