// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the hybrid cache.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `hybrid_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `tier`: memory, redis
//! - `operation`: get, set, del, invalidate, warm
//! - `status`: hit, miss, success, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a cache operation outcome.
pub fn record_operation(tier: &str, operation: &str, status: &str) {
    counter!(
        "hybrid_cache_operations_total",
        "tier" => tier.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(tier: &str, operation: &str, duration: Duration) {
    histogram!(
        "hybrid_cache_operation_seconds",
        "tier" => tier.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record an error with category for alerting.
pub fn record_error(tier: &str, operation: &str, error_type: &str) {
    counter!(
        "hybrid_cache_errors_total",
        "tier" => tier.to_string(),
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// Record memory-tier eviction events.
pub fn record_eviction(count: usize) {
    counter!("hybrid_cache_evictions_total").increment(count as u64);
}

/// Set current memory-tier entry count.
pub fn set_memory_entries(count: usize) {
    gauge!("hybrid_cache_memory_entries").set(count as f64);
}

/// Set current memory-tier approximate size in bytes.
pub fn set_memory_bytes(bytes: usize) {
    gauge!("hybrid_cache_memory_bytes").set(bytes as f64);
}

/// Set overall hit rate (0.0 - 1.0).
pub fn set_hit_rate(rate: f64) {
    gauge!("hybrid_cache_hit_rate").set(rate);
}

/// Set remote backend health (1 = healthy, 0 = unhealthy).
pub fn set_backend_healthy(backend: &str, healthy: bool) {
    gauge!(
        "hybrid_cache_backend_healthy",
        "backend" => backend.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}

/// A timing guard that records latency on drop.
pub struct LatencyTimer {
    tier: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer.
    pub fn new(tier: &'static str, operation: &'static str) -> Self {
        Self {
            tier,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.tier, self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API compiles and doesn't panic. In production,
    // you'd use metrics-util's Recorder for assertions.

    #[test]
    fn test_record_operation() {
        record_operation("memory", "get", "hit");
        record_operation("redis", "get", "miss");
        record_operation("redis", "set", "error");
    }

    #[test]
    fn test_record_latency() {
        record_latency("memory", "get", Duration::from_micros(5));
        record_latency("redis", "set", Duration::from_millis(3));
    }

    #[test]
    fn test_gauges() {
        set_memory_entries(512);
        set_memory_bytes(1024 * 64);
        set_hit_rate(0.85);
        set_backend_healthy("redis", true);
    }

    #[test]
    fn test_eviction_and_error_counters() {
        record_eviction(3);
        record_error("redis", "get", "transport");
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("memory", "get");
            std::thread::sleep(Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
