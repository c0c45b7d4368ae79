//! Bounded in-process map with LRU eviction.
//!
//! Fixed-capacity, recency-ordered key/value store backed by an
//! [`IndexMap`]: entries are kept in access order, the front entry is the
//! least recently used and is evicted first when the capacity ceiling is
//! exceeded. Each entry carries an optional TTL; expired entries read as
//! misses and are dropped on access.
//!
//! This tier has no I/O and cannot fail. Counters (hits, misses,
//! evictions, lookup latency) are plain fields mutated under the owner's
//! lock; [`BoundedLru::metrics`] snapshots them.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde_json::Value;

/// Called with the evicted key whenever capacity eviction removes an entry.
pub type EvictionHook = Box<dyn Fn(&str) + Send + Sync>;

struct CacheEntry {
    value: Value,
    size_bytes: usize,
    inserted: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.inserted.elapsed() > ttl)
    }
}

/// Point-in-time read of the memory tier counters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MemoryMetrics {
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses); 0.0 when no lookups have occurred.
    pub hit_rate: f64,
    pub entries: usize,
    pub memory_bytes: usize,
    pub evictions: u64,
    /// Running average lookup time in microseconds.
    pub avg_lookup_micros: f64,
}

pub struct BoundedLru {
    entries: IndexMap<String, CacheEntry>,
    max_entries: usize,
    default_ttl: Option<Duration>,
    approx_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    lookup_micros_total: u64,
    on_evict: Option<EvictionHook>,
}

/// Rough in-memory footprint of a JSON value, for the memory-usage gauge.
/// Deliberately cheap rather than exact.
fn value_size(v: &Value) -> usize {
    match v {
        Value::Null | Value::Bool(_) | Value::Number(_) => 16,
        Value::String(s) => 24 + s.len(),
        Value::Array(items) => 24 + items.iter().map(value_size).sum::<usize>(),
        Value::Object(map) => {
            24 + map
                .iter()
                .map(|(k, v)| 24 + k.len() + value_size(v))
                .sum::<usize>()
        }
    }
}

impl BoundedLru {
    /// Create a map with the given capacity ceiling and default TTL.
    ///
    /// Capacity validation is the coordinator's job; a zero capacity here
    /// would evict on every insert.
    #[must_use]
    pub fn new(max_entries: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            entries: IndexMap::new(),
            max_entries,
            default_ttl,
            approx_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            lookup_micros_total: 0,
            on_evict: None,
        }
    }

    /// Install a hook fired with each capacity-evicted key.
    pub fn set_eviction_hook(&mut self, hook: EvictionHook) {
        self.on_evict = Some(hook);
    }

    /// Look up a key, refreshing its recency on hit.
    ///
    /// Expired entries are removed and count as misses. Every call counts
    /// exactly one hit or one miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let start = Instant::now();

        let result = match self.entries.shift_remove_entry(key) {
            Some((_, entry)) if entry.is_expired() => {
                self.approx_bytes = self.approx_bytes.saturating_sub(entry.size_bytes);
                self.misses += 1;
                None
            }
            Some((key, entry)) => {
                self.hits += 1;
                let value = entry.value.clone();
                // Reinsert at the back: most recently used
                self.entries.insert(key, entry);
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        };

        self.lookup_micros_total = self
            .lookup_micros_total
            .saturating_add(start.elapsed().as_micros() as u64);
        result
    }

    /// Insert or replace, evicting the least-recently-used entry first if
    /// the map is at capacity.
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) {
        let size = key.len() + value_size(&value);

        if let Some(old) = self.entries.shift_remove(key) {
            self.approx_bytes = self.approx_bytes.saturating_sub(old.size_bytes);
        } else if self.entries.len() >= self.max_entries {
            self.evict_lru();
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                size_bytes: size,
                inserted: Instant::now(),
                ttl: ttl.or(self.default_ttl),
            },
        );
        self.approx_bytes += size;
    }

    fn evict_lru(&mut self) {
        if let Some((key, entry)) = self.entries.shift_remove_index(0) {
            self.approx_bytes = self.approx_bytes.saturating_sub(entry.size_bytes);
            self.evictions += 1;
            if let Some(ref hook) = self.on_evict {
                hook(&key);
            }
        }
    }

    /// Remove one entry. No remote propagation happens here; that is the
    /// coordinator's responsibility.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.entries.shift_remove(key) {
            Some(entry) => {
                self.approx_bytes = self.approx_bytes.saturating_sub(entry.size_bytes);
                true
            }
            None => false,
        }
    }

    /// Remove all entries. Counters are retained.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.approx_bytes = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the key is currently present and unexpired, without
    /// touching recency or counters.
    #[must_use]
    pub fn peek(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| !e.is_expired())
    }

    #[must_use]
    pub fn metrics(&self) -> MemoryMetrics {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        };
        let avg_lookup_micros = if lookups == 0 {
            0.0
        } else {
            self.lookup_micros_total as f64 / lookups as f64
        };

        MemoryMetrics {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            entries: self.entries.len(),
            memory_bytes: self.approx_bytes,
            evictions: self.evictions,
            avg_lookup_micros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_miss_on_empty() {
        let mut lru = BoundedLru::new(4, None);
        assert!(lru.get("nope").is_none());
        assert_eq!(lru.metrics().misses, 1);
        assert_eq!(lru.metrics().hits, 0);
    }

    #[test]
    fn test_set_then_get() {
        let mut lru = BoundedLru::new(4, None);
        lru.set("k", json!({"a": 1}), None);
        assert_eq!(lru.get("k"), Some(json!({"a": 1})));
        assert_eq!(lru.metrics().hits, 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut lru = BoundedLru::new(4, None);
        lru.set("k", json!(1), None);
        lru.set("k", json!(2), None);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_capacity_evicts_exactly_one_lru() {
        let mut lru = BoundedLru::new(3, None);
        lru.set("a", json!(1), None);
        lru.set("b", json!(2), None);
        lru.set("c", json!(3), None);
        // N+1th distinct key evicts exactly the least-recently-used ("a")
        lru.set("d", json!(4), None);

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.metrics().evictions, 1);
        assert!(!lru.peek("a"));
        assert!(lru.peek("b") && lru.peek("c") && lru.peek("d"));
    }

    #[test]
    fn test_get_refreshes_recency() {
        // Capacity 2: set a, set b, touch a, set c → b is evicted
        let mut lru = BoundedLru::new(2, None);
        lru.set("a", json!(1), None);
        lru.set("b", json!(2), None);
        assert_eq!(lru.get("a"), Some(json!(1)));
        lru.set("c", json!(3), None);

        assert!(lru.get("b").is_none());
        assert_eq!(lru.get("a"), Some(json!(1)));
        assert_eq!(lru.get("c"), Some(json!(3)));
        assert_eq!(lru.metrics().evictions, 1);
    }

    #[test]
    fn test_hits_plus_misses_equals_lookups() {
        let mut lru = BoundedLru::new(2, None);
        lru.set("a", json!(1), None);
        for key in ["a", "b", "a", "c", "a", "a"] {
            lru.get(key);
        }
        let m = lru.metrics();
        assert_eq!(m.hits + m.misses, 6);
        assert_eq!(m.hits, 4);
        assert_eq!(m.misses, 2);
    }

    #[test]
    fn test_hit_rate_zero_without_lookups() {
        let lru = BoundedLru::new(2, None);
        let m = lru.metrics();
        // Defined as 0.0, never NaN
        assert_eq!(m.hit_rate, 0.0);
        assert_eq!(m.avg_lookup_micros, 0.0);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut lru = BoundedLru::new(2, Some(Duration::from_nanos(1)));
        lru.set("k", json!(1), None);
        std::thread::sleep(Duration::from_millis(2));

        assert!(lru.get("k").is_none());
        let m = lru.metrics();
        assert_eq!(m.misses, 1);
        assert_eq!(m.entries, 0);
        // TTL expiry is not a capacity eviction
        assert_eq!(m.evictions, 0);
    }

    #[test]
    fn test_per_entry_ttl_overrides_default() {
        let mut lru = BoundedLru::new(2, Some(Duration::from_nanos(1)));
        lru.set("k", json!(1), Some(Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(lru.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_delete_and_clear() {
        let mut lru = BoundedLru::new(4, None);
        lru.set("a", json!(1), None);
        lru.set("b", json!(2), None);

        assert!(lru.delete("a"));
        assert!(!lru.delete("a"));
        assert_eq!(lru.len(), 1);

        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.metrics().memory_bytes, 0);
    }

    #[test]
    fn test_eviction_hook_fires_with_victim_key() {
        use std::sync::{Arc, Mutex};

        let evicted: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();

        let mut lru = BoundedLru::new(1, None);
        lru.set_eviction_hook(Box::new(move |key| {
            sink.lock().unwrap().push(key.to_string());
        }));

        lru.set("a", json!(1), None);
        lru.set("b", json!(2), None);

        assert_eq!(*evicted.lock().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_memory_bytes_tracks_inserts_and_removals() {
        let mut lru = BoundedLru::new(4, None);
        lru.set("a", json!("hello"), None);
        let after_one = lru.metrics().memory_bytes;
        assert!(after_one > 0);

        lru.set("b", json!("world"), None);
        assert!(lru.metrics().memory_bytes > after_one);

        lru.delete("b");
        assert_eq!(lru.metrics().memory_bytes, after_one);
    }

    #[test]
    fn test_counters_through_eviction_sequence() {
        // set a=1; set b=2; get a; set c=3 evicts b; b miss; a hit; c hit
        let mut lru = BoundedLru::new(2, None);
        lru.set("a", json!(1), None);
        lru.set("b", json!(2), None);
        assert_eq!(lru.get("a"), Some(json!(1)));
        lru.set("c", json!(3), None);

        assert!(lru.get("b").is_none());
        assert_eq!(lru.get("a"), Some(json!(1)));
        assert_eq!(lru.get("c"), Some(json!(3)));

        let m = lru.metrics();
        assert_eq!(m.evictions, 1);
        assert_eq!(m.hits, 3);
        assert_eq!(m.misses, 1);
    }
}
