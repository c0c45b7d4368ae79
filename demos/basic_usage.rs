// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic hybrid-cache usage example.
//!
//! Demonstrates:
//! 1. Connecting to Redis
//! 2. Warming the cache with known-hot keys
//! 3. Reads served from memory vs. Redis (with timing)
//! 4. Pattern invalidation
//! 5. Metrics snapshot and raw metrics dump
//!
//! # Prerequisites
//!
//! A local Redis:
//! ```bash
//! docker run --rm -p 6379:6379 redis:7-alpine
//! ```
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use hybrid_cache::{CacheConfig, HybridCache, WarmEntry, WritePolicy};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install metrics recorder (captures all metrics for export)
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    // Simple logging (no filter for simplicity)
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("== hybrid-cache: basic usage ==\n");

    let config = CacheConfig {
        redis_url: Some("redis://localhost:6379".into()),
        redis_prefix: Some("brand:".into()),
        memory_max_entries: 1024,
        write_policy: WritePolicy::WriteThrough,
        ..Default::default()
    };

    println!("Connecting to Redis...");
    let cache = HybridCache::connect(config).await?;

    let health = cache.health_check().await;
    println!("Health: memory={} redis={}\n", health.memory, health.redis);

    // Warm known-hot keys
    println!("Warming cache...");
    cache
        .warm_cache(vec![
            WarmEntry::new("logo.acme", json!({"format": "svg", "url": "https://cdn/acme.svg"})),
            WarmEntry::new("logo.globex", json!({"format": "png", "url": "https://cdn/globex.png"})),
            WarmEntry::new("card.smith", json!({"agent": "J. Smith", "color": "navy"})),
        ])
        .await?;

    // Reads: first from memory (warmed), then force a Redis round trip
    for key in ["logo.acme", "logo.globex", "card.smith"] {
        let start = std::time::Instant::now();
        let value: Option<serde_json::Value> = cache.get(key).await?;
        println!(
            "get {key} -> {} ({:?})",
            value.map(|v| v.to_string()).unwrap_or_else(|| "MISS".into()),
            start.elapsed()
        );
    }

    // Invalidate all logos; business cards survive
    println!("\nInvalidating logo.* ...");
    cache.invalidate_pattern("logo.*").await?;

    let logo: Option<serde_json::Value> = cache.get("logo.acme").await?;
    let card: Option<serde_json::Value> = cache.get("card.smith").await?;
    println!("after invalidation: logo.acme={logo:?}");
    println!("after invalidation: card.smith={}", card.map(|v| v.to_string()).unwrap_or_default());

    // Snapshot
    let m = cache.metrics();
    println!("\nMetrics snapshot:");
    println!("  memory_hits={} redis_hits={} misses={}", m.memory_hits, m.redis_hits, m.misses);
    println!("  writes={} errors={} hit_rate={:.2}", m.writes, m.errors, m.hit_rate);
    println!(
        "  memory tier: entries={} bytes={} evictions={}",
        m.memory.entries, m.memory.memory_bytes, m.memory.evictions
    );

    println!("\nRaw metrics:");
    dump_metrics(&snapshotter);

    Ok(())
}

/// Dump all captured metrics in a readable format
fn dump_metrics(snapshotter: &Snapshotter) {
    let snapshot = snapshotter.snapshot();

    for (composite_key, _, _, value) in snapshot.into_vec() {
        let (_kind, key) = composite_key.into_parts();
        let name = key.name().to_string();
        let labels: Vec<_> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };

        match value {
            DebugValue::Counter(v) => println!("  {name}{label_str} = {v}"),
            DebugValue::Gauge(v) => println!("  {name}{label_str} = {:.2}", v.into_inner()),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                println!("  {name}{label_str} count={count} sum={sum:.6}");
            }
        }
    }
}
