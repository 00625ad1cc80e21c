//! In-memory cache with per-entry expiration.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use docvault_core::constants::{
    DEFAULT_CACHE_TTL, DEFAULT_SWEEP_BATCH_SIZE, DEFAULT_SWEEP_INTERVAL, MAX_CACHE_TTL,
};
use docvault_core::error::{Result, VaultError};

/// Cache entry with its deadline.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries (0 = unbounded)
    pub max_entries: usize,
    /// TTL used by [`ExpiringCache::insert`]
    pub default_ttl: Duration,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
    /// Keys removed per write-lock acquisition while sweeping
    pub sweep_batch_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 0,
            default_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        }
    }
}

impl CacheConfig {
    /// Checks that the timings are usable.
    ///
    /// The sweep interval must exceed the default TTL, otherwise the sweeper
    /// wakes up more often than entries can possibly expire.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(VaultError::invalid_input("cache TTL must be positive"));
        }
        if self.sweep_interval <= self.default_ttl {
            return Err(VaultError::invalid_input(format!(
                "sweep interval ({:?}) must be longer than the cache TTL ({:?})",
                self.sweep_interval, self.default_ttl
            )));
        }
        if self.sweep_batch_size == 0 {
            return Err(VaultError::invalid_input("sweep batch size must be positive"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

/// Entries plus a deadline-ordered index of their keys.
///
/// Both collections always hold the same keys. Eviction and sweeping start
/// from the soonest deadline, so neither has to visit live entries.
struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    deadlines: BTreeSet<(Instant, String)>,
}

impl<V> Entries<V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            deadlines: BTreeSet::new(),
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.map.get(key)
    }

    fn insert(&mut self, key: String, entry: CacheEntry<V>) {
        if let Some(old) = self.map.get(&key) {
            self.deadlines.remove(&(old.expires_at, key.clone()));
        }
        self.deadlines.insert((entry.expires_at, key.clone()));
        self.map.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.map.remove(key)?;
        self.deadlines.remove(&(entry.expires_at, key.to_owned()));
        Some(entry)
    }

    /// Removes up to `limit` entries whose deadline has passed.
    fn remove_expired(&mut self, now: Instant, limit: usize) -> usize {
        let mut removed = 0;
        while removed < limit {
            if !self.deadlines.first().is_some_and(|(at, _)| now >= *at) {
                break;
            }
            if let Some((_, key)) = self.deadlines.pop_first() {
                self.map.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Removes the entry with the soonest deadline.
    fn remove_soonest(&mut self) -> bool {
        match self.deadlines.pop_first() {
            Some((_, key)) => self.map.remove(&key).is_some(),
            None => false,
        }
    }

    /// Number of expired entries; visits only those.
    fn expired_count(&self, now: Instant) -> usize {
        self.deadlines
            .iter()
            .take_while(|(at, _)| now >= *at)
            .count()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.deadlines.clear();
    }
}

/// Expiring key-value cache.
///
/// Thread-safe: every operation takes `&self`. Entries are replaced as a
/// whole under the write lock, so a reader sees either the previous or the
/// new value of a key. Expired entries are treated as absent immediately and
/// physically removed by the next `get`, insert-time cleanup or sweep.
pub struct ExpiringCache<V> {
    entries: RwLock<Entries<V>>,
    config: CacheConfig,
    counters: Counters,
}

impl<V: Clone> ExpiringCache<V> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(Entries::with_capacity(config.max_entries)),
            config,
            counters: Counters::default(),
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// TTL applied by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Gets a live value by key.
    ///
    /// An entry found past its deadline is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired_at(now) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.counters.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Re-check under the write lock: a writer may have replaced the entry.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Returns true if a live entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired_at(now))
    }

    /// Stores a value with the default TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.config.default_ttl);
    }

    /// Stores a value that expires after `ttl`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_CACHE_TTL);

        let mut entries = self.entries.write();
        let max = self.config.max_entries;
        if max > 0 && entries.len() >= max && entries.get(&key).is_none() {
            self.make_room(&mut entries, now);
        }

        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Frees one slot: an expired entry if any, else the one closest to expiry.
    fn make_room(&self, entries: &mut Entries<V>, now: Instant) {
        if entries.remove_expired(now, 1) > 0 {
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
        } else if entries.remove_soonest() {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Removes an entry. No-op if absent.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Removes several entries under a single lock acquisition.
    pub fn delete_many<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key.as_ref());
        }
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Evicts expired entries, at most `batch_size` per write lock.
    ///
    /// Each batch is taken from the front of the deadline index and the lock
    /// is released between batches. Live entries are never visited. Returns
    /// the number of entries removed.
    pub fn sweep_expired(&self, batch_size: usize) -> usize {
        let batch_size = batch_size.max(1);
        let now = Instant::now();

        let mut removed = 0;
        loop {
            let batch = self.entries.write().remove_expired(now, batch_size);
            removed += batch;
            if batch < batch_size {
                break;
            }
        }

        if removed > 0 {
            self.counters
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Evicts every expired entry using the configured batch size.
    pub fn purge_expired(&self) -> usize {
        self.sweep_expired(self.config.sweep_batch_size)
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read();
        let expired = entries.expired_count(now);
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in percent (0.0 when nothing was looked up yet).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SHORT: Duration = Duration::from_millis(5);
    const LONG: Duration = Duration::from_secs(3600);

    #[test]
    fn test_cache_set_get() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, LONG);
        assert_eq!(cache.get("alpha"), Some(1));
    }

    #[test]
    fn test_cache_miss() {
        let cache: ExpiringCache<u32> = ExpiringCache::new();
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, LONG);
        cache.set("alpha", 2u32, LONG);
        assert_eq!(cache.get("alpha"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_resets_deadline() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, SHORT);
        cache.set("alpha", 2u32, LONG);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("alpha"), Some(2));
    }

    #[test]
    fn test_cache_delete() {
        let cache = ExpiringCache::new();
        cache.insert("alpha", 1u32);
        cache.delete("alpha");
        assert!(cache.get("alpha").is_none());

        // Deleting again is a no-op.
        cache.delete("alpha");
        cache.delete("never-existed");
    }

    #[test]
    fn test_delete_many() {
        let cache = ExpiringCache::new();
        for key in ["a", "b", "c"] {
            cache.insert(key, 0u8);
        }
        cache.delete_many(["a", "c", "zzz"]);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_none());
    }

    #[test]
    fn test_get_before_deadline() {
        let cache = ExpiringCache::new();
        cache.set("alpha", "v", Duration::from_secs(60));
        assert_eq!(cache.get("alpha"), Some("v"));
    }

    #[test]
    fn test_expired_entry_is_absent_without_sweep() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, SHORT);
        std::thread::sleep(Duration::from_millis(20));

        assert!(!cache.contains_key("alpha"));
        // Still physically present until observed.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("alpha").is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, Duration::ZERO);
        assert!(cache.get("alpha").is_none());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, Duration::MAX);
        assert_eq!(cache.get("alpha"), Some(1));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache = ExpiringCache::new();
        for i in 0..10 {
            cache.set(format!("short-{i}"), i, SHORT);
        }
        cache.set("keep", 99, LONG);
        std::thread::sleep(Duration::from_millis(20));

        let removed = cache.sweep_expired(3);
        assert_eq!(removed, 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("keep"), Some(99));
    }

    #[test]
    fn test_purge_expired() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, SHORT);
        cache.set("beta", 2u32, LONG);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("beta"), Some(2));
    }

    #[test]
    fn test_cache_capacity_eviction() {
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let cache = ExpiringCache::with_config(config);
        cache.set("alpha", 1u32, Duration::from_secs(10));
        cache.set("beta", 2u32, Duration::from_secs(20));
        cache.set("gamma", 3u32, Duration::from_secs(30));

        assert_eq!(cache.len(), 2);
        // The entry closest to expiry goes first.
        assert!(cache.get("alpha").is_none());
        assert_eq!(cache.get("gamma"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_capacity_prefers_expired_entries() {
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let cache = ExpiringCache::with_config(config);
        cache.set("stale", 1u32, SHORT);
        cache.set("fresh", 2u32, LONG);
        std::thread::sleep(Duration::from_millis(20));
        cache.set("new", 3u32, LONG);

        assert_eq!(cache.get("fresh"), Some(2));
        assert_eq!(cache.get("new"), Some(3));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_capacity_keeps_latest_deadlines_under_churn() {
        let config = CacheConfig {
            max_entries: 3,
            ..CacheConfig::default()
        };
        let cache = ExpiringCache::with_config(config);
        for i in 0..100u64 {
            cache.set(format!("k{i}"), i, Duration::from_secs(60 + i));
        }

        assert_eq!(cache.len(), 3);
        for i in 97..100u64 {
            assert_eq!(cache.get(&format!("k{i}")), Some(i));
        }
        assert_eq!(cache.stats().evictions, 97);
    }

    #[test]
    fn test_deadline_index_follows_overwrites_and_deletes() {
        let cache = ExpiringCache::new();
        cache.set("alpha", 1u32, SHORT);
        cache.set("alpha", 2u32, LONG);
        cache.set("beta", 3u32, SHORT);
        cache.delete("beta");
        cache.set("gamma", 4u32, SHORT);
        cache.delete_many(["gamma"]);
        std::thread::sleep(Duration::from_millis(20));

        // The overwritten deadline of "alpha" must not make it sweepable.
        assert_eq!(cache.sweep_expired(10), 0);
        assert_eq!(cache.get("alpha"), Some(2));

        let entries = cache.entries.read();
        assert_eq!(entries.deadlines.len(), entries.map.len());
    }

    #[test]
    fn test_sweep_leaves_live_entries_and_stats_agree() {
        let cache = ExpiringCache::new();
        for i in 0..50 {
            cache.set(format!("live-{i}"), i, LONG);
        }
        for i in 0..7 {
            cache.set(format!("dead-{i}"), i, SHORT);
        }
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.stats().expired_entries, 7);
        assert_eq!(cache.sweep_expired(2), 7);
        let stats = cache.stats();
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.valid_entries, 50);
    }

    #[test]
    fn test_cache_clear() {
        let cache = ExpiringCache::new();
        cache.insert("alpha", 1u32);
        cache.insert("beta", 2u32);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stats() {
        let cache = ExpiringCache::new();
        cache.insert("alpha", 1u32);
        cache.set("beta", 2u32, SHORT);
        std::thread::sleep(Duration::from_millis(20));
        cache.get("alpha");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::default().validate().is_ok());

        let thrashing = CacheConfig {
            sweep_interval: DEFAULT_CACHE_TTL,
            ..CacheConfig::default()
        };
        assert!(thrashing.validate().is_err());

        let no_batch = CacheConfig {
            sweep_batch_size: 0,
            ..CacheConfig::default()
        };
        assert!(no_batch.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = CacheConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<CacheConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_concurrent_writers_same_key() {
        let cache = Arc::new(ExpiringCache::new());
        let writers = 16usize;

        std::thread::scope(|scope| {
            for i in 0..writers {
                let cache = &cache;
                scope.spawn(move || {
                    // Each writer stores a self-consistent value.
                    for _ in 0..200 {
                        cache.insert("shared", (i, format!("writer-{i}")));
                    }
                });
            }
        });

        let (i, label) = cache.get("shared").unwrap();
        assert!(i < writers);
        assert_eq!(label, format!("writer-{i}"));
    }

    #[test]
    fn test_concurrent_distinct_keys_are_not_lost() {
        let cache = Arc::new(ExpiringCache::new());
        cache.insert("bystander", 0usize);

        std::thread::scope(|scope| {
            for t in 0..8usize {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..100usize {
                        let key = format!("t{t}-k{i}");
                        cache.insert(key.clone(), i);
                        assert_eq!(cache.get(&key), Some(i));
                        if i % 2 == 0 {
                            cache.delete(&key);
                        }
                    }
                });
            }
        });

        assert_eq!(cache.get("bystander"), Some(0));
        // 8 threads x 50 surviving odd keys + bystander
        assert_eq!(cache.len(), 8 * 50 + 1);
        assert_eq!(cache.get("t3-k7"), Some(7));
        assert!(cache.get("t3-k8").is_none());
    }
}
