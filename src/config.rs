//! Configuration for the hybrid cache.
//!
//! # Example
//!
//! ```
//! use hybrid_cache::{CacheConfig, WritePolicy};
//!
//! // Minimal config (uses defaults)
//! let config = CacheConfig::default();
//! assert_eq!(config.memory_max_entries, 1024);
//! assert_eq!(config.write_policy, WritePolicy::WriteThrough);
//!
//! // Full config
//! let config = CacheConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     redis_prefix: Some("brand:".into()),
//!     memory_max_entries: 4096,
//!     write_policy: WritePolicy::WriteBehind,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::store::traits::CacheError;

/// Write propagation policy, fixed per coordinator instance.
///
/// Selected at construction; governs which tiers a `set` touches and in
/// what order. See [`crate::HybridCache::set`] for per-policy behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Both tiers written synchronously before `set` returns.
    WriteThrough,
    /// Memory written synchronously; the remote write is detached and
    /// may land out of order relative to other detached writes.
    WriteBehind,
    /// Remote tier only; the memory tier never holds a just-written key.
    WriteAround,
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteThrough => write!(f, "write-through"),
            Self::WriteBehind => write!(f, "write-behind"),
            Self::WriteAround => write!(f, "write-around"),
        }
    }
}

/// Configuration for the hybrid cache.
///
/// All fields have defaults. `redis_url` is required by
/// [`crate::HybridCache::connect`]; constructors that take a pre-built
/// remote store ignore it.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis connection string (e.g., "redis://localhost:6379")
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Key prefix for namespacing (e.g., "brand:" → "brand:logo.acme")
    #[serde(default)]
    pub redis_prefix: Option<String>,

    /// Default TTL for remote writes, in seconds (None = no expiry)
    #[serde(default)]
    pub remote_default_ttl_secs: Option<u64>,

    /// Memory tier capacity in entries (default: 1024, must be > 0)
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: usize,

    /// Default TTL for memory-tier entries, in seconds (None = no expiry)
    #[serde(default)]
    pub memory_default_ttl_secs: Option<u64>,

    /// Write propagation policy (default: write-through)
    #[serde(default = "default_write_policy")]
    pub write_policy: WritePolicy,

    /// Degrade remote transport failures to cache misses instead of
    /// propagating them (default: true)
    #[serde(default = "default_fallback")]
    pub fallback_on_remote_error: bool,

    /// Max in-flight detached write-behind writes (default: 64, must be > 0)
    #[serde(default = "default_write_behind_concurrency")]
    pub write_behind_concurrency: usize,
}

fn default_memory_max_entries() -> usize { 1024 }
fn default_write_policy() -> WritePolicy { WritePolicy::WriteThrough }
fn default_fallback() -> bool { true }
fn default_write_behind_concurrency() -> usize { 64 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_prefix: None,
            remote_default_ttl_secs: None,
            memory_max_entries: default_memory_max_entries(),
            memory_default_ttl_secs: None,
            write_policy: default_write_policy(),
            fallback_on_remote_error: default_fallback(),
            write_behind_concurrency: default_write_behind_concurrency(),
        }
    }
}

impl CacheConfig {
    /// Validate construction-time invariants.
    ///
    /// The coordinator refuses to start on a non-positive capacity or
    /// write-behind concurrency.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.memory_max_entries == 0 {
            return Err(CacheError::Config(
                "memory_max_entries must be greater than zero".into(),
            ));
        }
        if self.write_behind_concurrency == 0 {
            return Err(CacheError::Config(
                "write_behind_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
