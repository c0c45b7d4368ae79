//! In-process stand-in for the remote tier.
//!
//! Backs unit tests and the demo binary with the same [`RemoteStore`]
//! contract as the Redis wrapper, including TTL expiry and glob-style
//! pattern matching. Not a cache tier itself: entries have no capacity
//! bound or recency order.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{CacheError, RemoteStore};

struct Record {
    value: String,
    expires_at: Option<Instant>,
}

impl Record {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

pub struct MemoryKv {
    data: DashMap<String, Record>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Current record count, including not-yet-collected expired records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

/// Glob match supporting only the `*` wildcard, the subset Redis patterns
/// the coordinator relies on for invalidation.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

#[async_trait]
impl RemoteStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.data.get(key) {
            Some(record) if record.is_expired() => {
                drop(record);
                self.data.remove(key);
                Ok(None)
            }
            Some(record) => Ok(Some(record.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), CacheError> {
        self.data.insert(
            key.to_string(),
            Record {
                value: value.to_string(),
                expires_at: ttl_secs.map(|s| Instant::now() + Duration::from_secs(s)),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.data.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .data
            .iter()
            .filter(|r| !r.value().is_expired() && glob_match(pattern, r.key()))
            .map(|r| r.key().clone())
            .collect())
    }

    async fn flush(&self, pattern: Option<&str>) -> Result<u64, CacheError> {
        match pattern {
            None => {
                let count = self.data.len() as u64;
                self.data.clear();
                Ok(count)
            }
            Some(p) => {
                let victims: Vec<String> = self
                    .data
                    .iter()
                    .filter(|r| glob_match(p, r.key()))
                    .map(|r| r.key().clone())
                    .collect();
                let count = victims.len() as u64;
                for key in victims {
                    self.data.remove(&key);
                }
                Ok(count)
            }
        }
    }
}
