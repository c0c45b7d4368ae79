// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Hybrid cache coordinator.
//!
//! The [`HybridCache`] presents a single get/set/delete surface over two
//! storage tiers:
//! - **Memory**: bounded LRU map, exclusively owned via `Arc<Mutex<_>>` and
//!   optionally shared between coordinators
//! - **Remote**: namespaced key-value store (Redis in production)
//!
//! Writes follow the [`WritePolicy`] fixed at construction; reads always
//! check memory first and re-populate it from remote hits. Remote
//! transport failures degrade to cache misses when
//! `fallback_on_remote_error` is set, so a cache outage costs latency, not
//! availability.
//!
//! # Example
//!
//! ```rust,no_run
//! use hybrid_cache::{CacheConfig, HybridCache};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), hybrid_cache::CacheError> {
//! let config = CacheConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     redis_prefix: Some("brand:".into()),
//!     ..Default::default()
//! };
//! let cache = HybridCache::connect(config).await?;
//!
//! cache.set("logo.acme", &json!({"format": "svg"}), Some(300)).await?;
//! let logo: Option<serde_json::Value> = cache.get("logo.acme").await?;
//! # Ok(())
//! # }
//! ```

mod types;

pub use types::{CacheMetricsSnapshot, HealthStatus, WarmEntry};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::{CacheConfig, WritePolicy};
use crate::memory::BoundedLru;
use crate::store::redis::RedisKv;
use crate::store::traits::{CacheError, RemoteStore};

/// Coordinator-level counters, shared with detached write-behind tasks.
#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    redis_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

/// Two-tier cache coordinator.
///
/// # Thread Safety
///
/// `Send + Sync`; internal state uses atomics and a short-held
/// `parking_lot::Mutex` around the memory tier (never held across an
/// `.await`).
pub struct HybridCache {
    /// Memory tier. Injectable so several coordinators in one process can
    /// share a map instead of silently defeating in-process caching.
    memory: Arc<Mutex<BoundedLru>>,

    /// Remote tier (Redis in production, [`MemoryKv`] in tests).
    ///
    /// [`MemoryKv`]: crate::store::memory::MemoryKv
    remote: Arc<dyn RemoteStore>,

    policy: WritePolicy,
    fallback: bool,
    memory_default_ttl: Option<Duration>,
    remote_default_ttl: Option<u64>,
    counters: Arc<Counters>,

    /// Bounds in-flight detached write-behind writes.
    write_behind: Arc<Semaphore>,
}

impl HybridCache {
    /// Create a coordinator over a fresh memory tier and the given remote
    /// store. Fails on an invalid configuration.
    pub fn new(config: CacheConfig, remote: Arc<dyn RemoteStore>) -> Result<Self, CacheError> {
        config.validate()?;

        let mut lru = BoundedLru::new(
            config.memory_max_entries,
            config.memory_default_ttl_secs.map(Duration::from_secs),
        );
        lru.set_eviction_hook(Box::new(|key| {
            crate::metrics::record_eviction(1);
            debug!(key = %key, "evicted from memory tier");
        }));

        Self::with_shared_memory(config, remote, Arc::new(Mutex::new(lru)))
    }

    /// Create a coordinator over an existing memory tier.
    ///
    /// Use this to share one in-process map between coordinators (e.g.
    /// per-request construction). The map keeps whatever eviction hook it
    /// already carries.
    pub fn with_shared_memory(
        config: CacheConfig,
        remote: Arc<dyn RemoteStore>,
        memory: Arc<Mutex<BoundedLru>>,
    ) -> Result<Self, CacheError> {
        config.validate()?;

        Ok(Self {
            memory,
            remote,
            policy: config.write_policy,
            fallback: config.fallback_on_remote_error,
            memory_default_ttl: config.memory_default_ttl_secs.map(Duration::from_secs),
            remote_default_ttl: config.remote_default_ttl_secs,
            counters: Arc::new(Counters::default()),
            write_behind: Arc::new(Semaphore::new(config.write_behind_concurrency)),
        })
    }

    /// Connect to Redis per the config and build a coordinator over it.
    pub async fn connect(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let url = config.redis_url.as_deref().ok_or_else(|| {
            CacheError::Config("redis_url is required to connect".into())
        })?;
        let remote = RedisKv::with_prefix(url, config.redis_prefix.as_deref()).await?;

        Self::new(config, Arc::new(remote))
    }

    /// The configured write policy.
    #[must_use]
    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    /// Handle to the memory tier, for sharing with another coordinator.
    #[must_use]
    pub fn memory_tier(&self) -> Arc<Mutex<BoundedLru>> {
        self.memory.clone()
    }

    /// Whether the memory tier currently holds an unexpired entry for
    /// `key`, without touching recency or counters.
    #[must_use]
    pub fn peek_memory(&self, key: &str) -> bool {
        self.memory.lock().peek(key)
    }

    // --- Core operations ---

    /// Get a value, checking memory first and falling back to remote.
    ///
    /// A remote hit re-populates the memory tier so subsequent reads are
    /// served locally. Remote transport failures degrade to `Ok(None)`
    /// when fallback is enabled; malformed payloads always surface as
    /// [`CacheError::Serialization`].
    #[tracing::instrument(skip(self), fields(tier))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let start = Instant::now();

        let local = self.memory.lock().get(key);
        if let Some(value) = local {
            self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
            tracing::Span::current().record("tier", "memory");
            debug!("memory hit");
            crate::metrics::record_operation("memory", "get", "hit");
            crate::metrics::record_latency("memory", "get", start.elapsed());
            return Ok(Some(serde_json::from_value(value)?));
        }

        match self.remote.get(key).await {
            Ok(Some(raw)) => {
                let value: Value = serde_json::from_str(&raw)?;
                self.memory
                    .lock()
                    .set(key, value.clone(), self.memory_default_ttl);
                self.counters.redis_hits.fetch_add(1, Ordering::Relaxed);
                tracing::Span::current().record("tier", "redis");
                debug!("redis hit, populated memory tier");
                crate::metrics::record_operation("redis", "get", "hit");
                crate::metrics::record_latency("redis", "get", start.elapsed());
                Ok(Some(serde_json::from_value(value)?))
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::Span::current().record("tier", "miss");
                debug!("miss in both tiers");
                crate::metrics::record_operation("redis", "get", "miss");
                crate::metrics::record_latency("redis", "get", start.elapsed());
                Ok(None)
            }
            Err(e) if e.is_transport() && self.fallback => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::Span::current().record("tier", "degraded");
                warn!(error = %e, "remote get failed, degrading to miss");
                crate::metrics::record_error("redis", "get", "transport");
                Ok(None)
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_error("redis", "get", "transport");
                Err(e)
            }
        }
    }

    /// Set a value under the configured write policy.
    ///
    /// - **write-through**: memory then remote, both awaited; remote
    ///   transport failure surfaces unless fallback is enabled
    /// - **write-behind**: memory synchronously; the remote write is
    ///   detached and never awaited by the caller. Relative landing order
    ///   of concurrent detached writes is not guaranteed.
    /// - **write-around**: remote only; any stale memory entry for the key
    ///   is removed so the memory tier never serves a just-written value
    ///
    /// `ttl_secs` applies to both tiers, overriding the configured
    /// per-tier defaults.
    #[tracing::instrument(skip(self, value))]
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        let payload = value.to_string();
        self.counters.writes.fetch_add(1, Ordering::Relaxed);

        let memory_ttl = ttl_secs.map(Duration::from_secs).or(self.memory_default_ttl);
        let remote_ttl = ttl_secs.or(self.remote_default_ttl);

        match self.policy {
            WritePolicy::WriteThrough => {
                self.memory.lock().set(key, value, memory_ttl);
                crate::metrics::record_operation("memory", "set", "success");
                self.remote_write(key, &payload, remote_ttl).await
            }
            WritePolicy::WriteBehind => {
                self.memory.lock().set(key, value, memory_ttl);
                crate::metrics::record_operation("memory", "set", "success");
                self.spawn_remote_write(key.to_string(), payload, remote_ttl);
                Ok(())
            }
            WritePolicy::WriteAround => {
                // The memory tier must never hold a just-written key
                self.memory.lock().delete(key);
                self.remote_write(key, &payload, remote_ttl).await
            }
        }
    }

    /// Delete a key from both tiers.
    #[tracing::instrument(skip(self))]
    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.memory.lock().delete(key);

        match self.remote.del(key).await {
            Ok(()) => {
                crate::metrics::record_operation("redis", "del", "success");
                Ok(())
            }
            Err(e) if e.is_transport() && self.fallback => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "remote delete failed");
                crate::metrics::record_error("redis", "del", "transport");
                Ok(())
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_error("redis", "del", "transport");
                Err(e)
            }
        }
    }

    /// Invalidate all keys matching a glob-style pattern.
    ///
    /// The memory tier cannot pattern-match keys, so it is cleared
    /// wholesale; callers must not assume unrelated keys survive. The
    /// remote tier gets a pattern-scoped flush.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        self.memory.lock().clear();

        match self.remote.flush(Some(pattern)).await {
            Ok(removed) => {
                debug!(removed, "pattern invalidation flushed remote keys");
                crate::metrics::record_operation("redis", "invalidate", "success");
                Ok(())
            }
            Err(e) if e.is_transport() && self.fallback => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "remote pattern flush failed");
                crate::metrics::record_error("redis", "invalidate", "transport");
                Ok(())
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_error("redis", "invalidate", "transport");
                Err(e)
            }
        }
    }

    /// Sequentially apply `set` for each entry under the configured policy.
    ///
    /// Intended for startup population of known-hot keys. No rollback:
    /// a failure partway through leaves earlier keys warmed and later ones
    /// not. That partial state is an accepted limitation.
    #[tracing::instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn warm_cache(&self, entries: Vec<WarmEntry>) -> Result<(), CacheError> {
        for entry in entries {
            self.set(&entry.key, &entry.value, None).await?;
            crate::metrics::record_operation("memory", "warm", "success");
        }
        Ok(())
    }

    /// Liveness probe for both tiers.
    ///
    /// The remote tier is healthy iff a trivial `exists` call does not
    /// error; the key probed for does not need to exist.
    pub async fn health_check(&self) -> HealthStatus {
        let memory = {
            let map = self.memory.lock();
            let _ = map.len();
            true
        };

        let redis = self.remote.exists("healthcheck").await.is_ok();
        crate::metrics::set_backend_healthy("redis", redis);

        HealthStatus { memory, redis }
    }

    /// Merge memory-tier metrics with coordinator counters.
    ///
    /// Also refreshes the exported gauges, so calling this before a
    /// metrics scrape keeps them current.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        let memory = self.memory.lock().metrics();

        let memory_hits = self.counters.memory_hits.load(Ordering::Relaxed);
        let redis_hits = self.counters.redis_hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = memory_hits + redis_hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            (memory_hits + redis_hits) as f64 / lookups as f64
        };

        crate::metrics::set_memory_entries(memory.entries);
        crate::metrics::set_memory_bytes(memory.memory_bytes);
        crate::metrics::set_hit_rate(hit_rate);

        CacheMetricsSnapshot {
            memory,
            memory_hits,
            redis_hits,
            misses,
            writes: self.counters.writes.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    // --- Internal helpers ---

    /// Awaited remote write with the fallback switch applied.
    async fn remote_write(
        &self,
        key: &str,
        payload: &str,
        ttl_secs: Option<u64>,
    ) -> Result<(), CacheError> {
        match self.remote.set(key, payload, ttl_secs).await {
            Ok(()) => {
                crate::metrics::record_operation("redis", "set", "success");
                Ok(())
            }
            Err(e) if e.is_transport() && self.fallback => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "remote write failed, memory tier retained");
                crate::metrics::record_error("redis", "set", "transport");
                Ok(())
            }
            Err(e) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_error("redis", "set", "transport");
                Err(e)
            }
        }
    }

    /// Detached write-behind write. The semaphore bounds how many are in
    /// flight at once; queued tasks wait for a permit. Once spawned, a
    /// write cannot be cancelled.
    fn spawn_remote_write(&self, key: String, payload: String, ttl_secs: Option<u64>) {
        let remote = self.remote.clone();
        let counters = self.counters.clone();
        let semaphore = self.write_behind.clone();

        tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            match remote.set(&key, &payload, ttl_secs).await {
                Ok(()) => {
                    crate::metrics::record_operation("redis", "set", "success");
                }
                Err(e) => {
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, error = %e, "detached write-behind write failed");
                    crate::metrics::record_error("redis", "set", "write_behind");
                }
            }
        });
    }
}
