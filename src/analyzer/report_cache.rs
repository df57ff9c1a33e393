//! TTL cache for analysis reports.
//!
//! Keyed by `token_mode`; a fresh entry short-circuits the whole pipeline
//! and costs no budget. Entries expire on their own after the TTL, so two
//! requests more than a TTL apart always produce distinct reports.

use crate::types::{AnalysisMode, AnalysisReport};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Report cache with hit/miss accounting.
#[derive(Clone)]
pub struct ReportCache {
    cache: Cache<String, Arc<AnalysisReport>>,
    metrics: Arc<Mutex<CacheMetrics>>,
    ttl_seconds: u64,
}

#[derive(Debug, Default)]
struct CacheMetrics {
    hits: u64,
    misses: u64,
    updates: u64,
    invalidations: u64,
}

impl ReportCache {
    pub fn new(max_capacity: usize, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity as u64)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        Self {
            cache,
            metrics: Arc::new(Mutex::new(CacheMetrics::default())),
            ttl_seconds,
        }
    }

    /// Cached report for `(token, mode)` if one exists and has not expired.
    pub async fn get(&self, token: &str, mode: AnalysisMode) -> Option<Arc<AnalysisReport>> {
        let key = AnalysisReport::cache_key(token, mode);
        let result = self.cache.get(&key).await;

        let mut metrics = self.metrics.lock().await;
        if result.is_some() {
            metrics.hits += 1;
            debug!("Cache hit for {}", key);
        } else {
            metrics.misses += 1;
            debug!("Cache miss for {}", key);
        }

        result
    }

    /// Store a freshly computed report.
    pub async fn set(&self, report: Arc<AnalysisReport>) {
        let key = AnalysisReport::cache_key(&report.token, report.mode);
        self.cache.insert(key, report).await;
        self.metrics.lock().await.updates += 1;
    }

    /// Drop the entry for `(token, mode)`, forcing the next request to
    /// recompute.
    pub async fn invalidate(&self, token: &str, mode: AnalysisMode) {
        let key = AnalysisReport::cache_key(token, mode);
        self.cache.invalidate(&key).await;
        self.metrics.lock().await.invalidations += 1;
    }

    pub async fn metrics(&self) -> CacheMetricsSnapshot {
        let metrics = self.metrics.lock().await;
        let total = metrics.hits + metrics.misses;
        let hit_rate = if total > 0 {
            metrics.hits as f64 / total as f64
        } else {
            0.0
        };

        CacheMetricsSnapshot {
            hits: metrics.hits,
            misses: metrics.misses,
            updates: metrics.updates,
            invalidations: metrics.invalidations,
            hit_rate,
            entry_count: self.cache.entry_count(),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

/// Point-in-time view of cache counters.
#[derive(Debug, Clone)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub updates: u64,
    pub invalidations: u64,
    pub hit_rate: f64,
    pub entry_count: u64,
}
