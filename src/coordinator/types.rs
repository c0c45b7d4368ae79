//! Public types for the hybrid cache coordinator.

use serde::Serialize;
use serde_json::Value;

use crate::memory::MemoryMetrics;

/// Liveness probe result.
///
/// `memory` reports whether the in-process tier is queryable (always true
/// for a constructed coordinator); `redis` reports whether a trivial
/// `exists` call against the remote tier succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub memory: bool,
    pub redis: bool,
}

impl HealthStatus {
    /// Both tiers healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.memory && self.redis
    }
}

/// Point-in-time merge of memory-tier metrics and coordinator counters.
///
/// Derived, not persisted; recomputed on each [`metrics`] call from live
/// counters.
///
/// [`metrics`]: super::HybridCache::metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheMetricsSnapshot {
    /// Memory-tier counters (hits/misses/evictions/latency as seen by the
    /// bounded map itself).
    pub memory: MemoryMetrics,
    /// Coordinator-level gets served from the memory tier.
    pub memory_hits: u64,
    /// Coordinator-level gets served from the remote tier.
    pub redis_hits: u64,
    /// Coordinator-level gets that missed both tiers (including degraded
    /// remote failures).
    pub misses: u64,
    /// Total `set` calls accepted.
    pub writes: u64,
    /// Remote failures observed (degraded or propagated).
    pub errors: u64,
    /// (memory_hits + redis_hits) / (memory_hits + redis_hits + misses);
    /// 0.0 when no lookups have occurred.
    pub hit_rate: f64,
}

/// One entry for [`warm_cache`](super::HybridCache::warm_cache).
#[derive(Debug, Clone, PartialEq)]
pub struct WarmEntry {
    pub key: String,
    pub value: Value,
}

impl WarmEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
