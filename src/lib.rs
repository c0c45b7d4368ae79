//! # Hybrid Cache
//!
//! A two-tier read-through cache with configurable write propagation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HybridCache Coordinator                  │
//! │  • Single get/set/delete surface over both tiers           │
//! │  • Write policy: write-through / write-behind / write-around│
//! │  • Merged metrics, health checks, pattern invalidation     │
//! └─────────────────────────────────────────────────────────────┘
//!                │                          │
//!                ▼                          ▼
//! ┌──────────────────────────┐  ┌──────────────────────────────┐
//! │   Memory: BoundedLru     │  │   Remote: RedisKv            │
//! │  • Capacity-bounded LRU  │  │  • Namespaced keys           │
//! │  • Per-entry TTL         │  │  • SCAN-based pattern flush  │
//! │  • Hit/miss/evict counts │  │  • Transport error isolation │
//! └──────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hybrid_cache::{CacheConfig, HybridCache, WritePolicy};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hybrid_cache::CacheError> {
//!     let config = CacheConfig {
//!         redis_url: Some("redis://localhost:6379".into()),
//!         redis_prefix: Some("brand:".into()),
//!         memory_max_entries: 4096,
//!         write_policy: WritePolicy::WriteThrough,
//!         ..Default::default()
//!     };
//!
//!     let cache = HybridCache::connect(config).await?;
//!
//!     cache.set("logo.acme", &json!({"format": "svg"}), Some(300)).await?;
//!
//!     // Memory first, then Redis; remote hits re-populate memory
//!     if let Some(logo) = cache.get::<serde_json::Value>("logo.acme").await? {
//!         println!("cached: {logo}");
//!     }
//!
//!     println!("hit rate: {:.2}", cache.metrics().hit_rate);
//!     Ok(())
//! }
//! ```
//!
//! ## Degradation
//!
//! With `fallback_on_remote_error` set (the default), remote transport
//! failures are logged and degrade to cache misses: consumers fall back to
//! recomputing the underlying value instead of seeing an error. Disable it
//! to have transport errors propagate. Serialization errors always
//! propagate; fallback never masks data-integrity problems.
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`HybridCache`] orchestrating both tiers
//! - [`memory`]: Bounded in-process LRU map
//! - [`store`]: Remote tier (Redis, plus an in-memory stand-in)
//! - [`memoize`]: Memoize a computation through an explicit coordinator
//! - [`config`]: Construction-time configuration
//! - [`metrics`]: `metrics`-crate instrumentation helpers

pub mod config;
pub mod coordinator;
pub mod memoize;
pub mod memory;
pub mod metrics;
pub mod store;

pub use config::{CacheConfig, WritePolicy};
pub use coordinator::{CacheMetricsSnapshot, HealthStatus, HybridCache, WarmEntry};
pub use memoize::memoized;
pub use memory::{BoundedLru, MemoryMetrics};
pub use metrics::LatencyTimer;
pub use store::traits::{CacheError, RemoteStore};
pub use store::{MemoryKv, RedisKv};
