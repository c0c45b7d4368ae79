//! Function memoization through an explicit coordinator.
//!
//! Attaches caching to a computation without constructing a cache of its
//! own: the caller passes the [`HybridCache`] to use, a key, and a compute
//! future. This keeps cache ownership explicit and lets every memoized
//! call site share one memory tier.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::coordinator::HybridCache;
use crate::store::traits::CacheError;

/// Return the cached value for `key`, or run `compute`, store its result
/// under the coordinator's write policy, and return it.
///
/// - The stored value is subject to the coordinator's policy; under
///   write-around the result lands remote-only, so repeated calls still
///   round-trip until a read populates the memory tier.
/// - Errors from `compute` are returned without touching the cache.
/// - A cache write failure follows the coordinator's fallback switch; with
///   fallback enabled the computed value is still returned.
///
/// # Example
///
/// ```rust,no_run
/// # use hybrid_cache::{HybridCache, memoized};
/// # async fn example(cache: &HybridCache) -> Result<(), hybrid_cache::CacheError> {
/// let report: Vec<u64> = memoized(cache, "report.monthly", Some(600), || async {
///     Ok(expensive_aggregation().await)
/// })
/// .await?;
/// # Ok(())
/// # }
/// # async fn expensive_aggregation() -> Vec<u64> { vec![] }
/// ```
pub async fn memoized<T, F, Fut>(
    cache: &HybridCache,
    key: &str,
    ttl_secs: Option<u64>,
    compute: F,
) -> Result<T, CacheError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, CacheError>>,
{
    if let Some(value) = cache.get::<T>(key).await? {
        debug!(key = %key, "memoized value served from cache");
        return Ok(value);
    }

    let value = compute().await?;
    cache.set(key, &value, ttl_secs).await?;
    Ok(value)
}
