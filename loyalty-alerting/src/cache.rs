//! TTL cache for metrics snapshots and alert throttling
//!
//! The monitor only needs get/set-with-TTL, expressed as a capability trait
//! so a shared cache service can slot in behind the same interface. The
//! bundled implementation is in-process: a dashmap of values with expiry
//! deadlines, plus hit/miss counters.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Cache TTLs (seconds)
pub mod ttl {
    /// Cached metrics snapshot
    pub const METRICS_SNAPSHOT: u64 = 300;
    /// Per-alert-type suppression window
    pub const ALERT_SUPPRESSION: u64 = 3600;
}

/// Cache key layout
pub mod keys {
    /// The rolling metrics snapshot
    pub const METRICS_SNAPSHOT: &str = "economy:metrics:snapshot";

    /// Suppression key for one alert type
    pub fn alert_suppression(alert_code: &str) -> String {
        format!("economy:alert:suppress:{}", alert_code)
    }
}

/// Get/set-with-TTL capability
pub trait MetricsCache: Send + Sync {
    /// Get a live value, None when absent or expired
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value that expires after `ttl_secs`
    fn set(&self, key: &str, value: String, ttl_secs: u64);
}

/// In-process TTL cache
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            let (value, deadline) = entry.value();
            if Instant::now() < *deadline {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value.clone());
            }
        }

        // Absent or past its deadline
        self.entries.remove(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, key: &str, value: String, ttl_secs: u64) {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries.insert(key.to_string(), (value, deadline));
    }
}
