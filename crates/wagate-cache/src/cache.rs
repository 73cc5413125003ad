//! TTL cache with lazy eviction and background sweeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::namespace::{Namespace, Namespaced};
use crate::sweep::{self, SweepHandle};

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    /// Whether the entry may still be returned at `now`.
    fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Time left before expiry, zero once expired.
    fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

#[derive(Debug, Default)]
struct Counters {
    inserts: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// State shared between cache handles and the sweep task.
pub(crate) struct Shared<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    counters: Counters,
    closed: AtomicBool,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl<V> Shared<V> {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Keys whose entries are expired right now. Only takes the read lock.
    pub(crate) fn collect_expired(&self) -> Vec<String> {
        let now = self.clock.now();
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_live_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Remove the given keys, skipping any that were re-set since they were collected.
    pub(crate) fn remove_expired(&self, keys: &[String]) -> usize {
        let mut entries = self.entries.write();
        let now = self.clock.now();
        let mut removed = 0;
        for key in keys {
            if entries.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
                entries.remove(key);
                removed += 1;
            }
        }
        drop(entries);

        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.cancel();
        }
    }
}

/// String-keyed cache whose entries expire independently.
///
/// This cache provides:
/// - Per-entry TTL, checked on every read (expired values are never returned)
/// - Lazy removal of expired entries on access
/// - A background sweep on the ambient tokio runtime that reclaims
///   expired entries nobody reads
/// - Thread-safe access via a single `RwLock` around the key space
///
/// Handles are cheap to clone and share the same storage. The sweep task
/// only holds a weak reference, so dropping the last handle stops it.
pub struct TtlCache<V> {
    shared: Arc<Shared<V>>,
    config: CacheConfig,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Create a new cache using the system clock.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    /// Construct without validating; `config` must already be valid.
    pub(crate) fn build(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::new()),
            counters: Counters::default(),
            closed: AtomicBool::new(false),
            clock,
            sweeper: Mutex::new(None),
        });

        if config.enable_cleanup_task {
            match sweep::spawn(
                Arc::downgrade(&shared),
                config.cleanup_interval,
                config.sweep_batch_size,
            ) {
                Some(handle) => *shared.sweeper.lock() = Some(handle),
                None => warn!(
                    "No tokio runtime available, expired entries will only be removed on access"
                ),
            }
        }

        Self { shared, config }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Whether the background sweep is still running.
    ///
    /// False when it was disabled, never spawned (no runtime), cancelled by
    /// [`destroy`](Self::destroy), or stopped because its runtime shut down.
    pub fn is_sweeping(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: &str, value: V) -> Result<()> {
        self.set_with_ttl(key, value, self.config.default_ttl)
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// A zero TTL expires immediately: the previous entry is dropped and
    /// nothing observable is stored.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        self.ensure_open()?;
        validate_key(key)?;

        let now = self.shared.clock.now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| Error::InvalidDuration(format!("TTL {ttl:?} is out of range")))?;

        let mut entries = self.shared.entries.write();
        // Checked under the lock so a concurrent destroy cannot be outlived.
        if self.shared.is_closed() {
            return Err(Error::CacheClosed);
        }
        if ttl.is_zero() {
            entries.remove(key);
        } else {
            entries.insert(key.to_string(), CacheEntry::new(value, expires_at));
        }
        drop(entries);

        self.shared.counters.inserts.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, ttl = ?ttl, "Cache set");
        Ok(())
    }

    /// Get a live value, removing the entry if it has expired.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        self.ensure_open()?;
        let now = self.shared.clock.now();

        {
            let entries = self.shared.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live_at(now) => {
                    self.shared.counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(key = %key, "Cache hit");
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => {
                    self.shared.counters.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "Cache miss");
                    return Ok(None);
                }
            }
        }

        // Expired under the read lock; re-check under the write lock in case
        // another caller replaced it in between.
        let mut entries = self.shared.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_live_at(now) => {
                self.shared.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {
                entries.remove(key);
                self.shared.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache entry expired");
            }
            None => {}
        }
        drop(entries);

        self.shared.counters.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    /// Check for a live entry without touching hit/miss counters.
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let now = self.shared.clock.now();
        Ok(self
            .shared
            .entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live_at(now)))
    }

    /// Time left before the entry under `key` expires.
    pub fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>> {
        self.ensure_open()?;
        let now = self.shared.clock.now();
        Ok(self
            .shared
            .entries
            .read()
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.remaining_at(now)))
    }

    /// Remove an entry. Returns whether a live entry was removed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let now = self.shared.clock.now();

        let removed = self.shared.entries.write().remove(key);
        match removed {
            Some(entry) if entry.is_live_at(now) => {
                debug!(key = %key, "Cache delete");
                Ok(true)
            }
            Some(_) => {
                self.shared.counters.evictions.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Remove every entry. Counters are left untouched.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        let removed = {
            let mut entries = self.shared.entries.write();
            let removed = entries.len();
            entries.clear();
            removed
        };
        info!(removed = removed, "Cache cleared");
        Ok(())
    }

    /// Remove expired entries now, in batches of `sweep_batch_size`.
    ///
    /// This is what the background task runs on every tick, but it can also
    /// be called manually.
    pub fn sweep(&self) -> Result<usize> {
        self.ensure_open()?;
        let expired = self.shared.collect_expired();
        let removed: usize = expired
            .chunks(self.config.sweep_batch_size.max(1))
            .map(|chunk| self.shared.remove_expired(chunk))
            .sum();

        if removed > 0 {
            debug!(removed = removed, "Swept expired cache entries");
        }
        Ok(removed)
    }

    /// Snapshot of size and lifetime counters.
    ///
    /// Read-only: expired entries are neither removed nor counted as misses.
    pub fn stats(&self) -> CacheStats {
        let counters = &self.shared.counters;
        CacheStats {
            size: self.len(),
            inserted_total: counters.inserts.load(Ordering::Relaxed),
            hit_total: counters.hits.load(Ordering::Relaxed),
            miss_total: counters.misses.load(Ordering::Relaxed),
            evicted_total: counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Cancel the sweep task and drop all entries.
    ///
    /// Idempotent. Afterwards every operation except [`stats`](Self::stats)
    /// fails with [`Error::CacheClosed`].
    pub fn destroy(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.shared.sweeper.lock().take() {
            handle.cancel();
        }
        self.shared.entries.write().clear();
        info!("Cache destroyed");
    }

    /// View of this cache scoped to a key prefix and TTL.
    pub fn namespace(&self, namespace: Namespace) -> Namespaced<V> {
        Namespaced::new(self.clone(), namespace)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.is_closed() {
            Err(Error::CacheClosed)
        } else {
            Ok(())
        }
    }
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored (as of the last access or sweep).
    pub size: usize,

    /// Successful `set` calls.
    pub inserted_total: u64,

    /// Reads that returned a value.
    pub hit_total: u64,

    /// Reads that returned nothing, including expired entries.
    pub miss_total: u64,

    /// Expired entries removed, lazily or by a sweep.
    pub evicted_total: u64,
}

impl CacheStats {
    /// Fraction of reads that were hits, if any reads happened.
    pub fn hit_rate(&self) -> Option<f64> {
        let reads = self.hit_total + self.miss_total;
        (reads > 0).then(|| self.hit_total as f64 / reads as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manual_cache() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig::new().with_cleanup_task(false);
        let cache = TtlCache::with_clock(config, clock.clone()).unwrap();
        (cache, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _) = manual_cache();

        cache.set("session:abc", "CONNECTED".to_string()).unwrap();

        assert_eq!(
            cache.get("session:abc").unwrap(),
            Some("CONNECTED".to_string())
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let (cache, _) = manual_cache();

        assert_eq!(cache.get("nonexistent").unwrap(), None);
        assert_eq!(cache.stats().miss_total, 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let (cache, _) = manual_cache();

        let result = cache.set("", "value".to_string());
        assert!(matches!(result, Err(Error::InvalidKey(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let (cache, clock) = manual_cache();

        cache
            .set_with_ttl("k", "v".to_string(), Duration::from_millis(100))
            .unwrap();

        clock.advance(Duration::from_millis(99));
        assert_eq!(cache.get("k").unwrap(), Some("v".to_string()));

        // Expiry is inclusive: now == expires_at is already absent.
        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("k").unwrap(), None);
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hit_total, 1);
        assert_eq!(stats.miss_total, 1);
        assert_eq!(stats.evicted_total, 1);
    }

    #[test]
    fn test_zero_ttl_is_never_observable() {
        let (cache, _) = manual_cache();

        cache.set("k", "old".to_string()).unwrap();
        cache.set_with_ttl("k", "new".to_string(), Duration::ZERO).unwrap();

        assert_eq!(cache.get("k").unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let (cache, clock) = manual_cache();

        cache
            .set_with_ttl("k", "v1".to_string(), Duration::from_secs(10))
            .unwrap();
        clock.advance(Duration::from_secs(8));
        cache
            .set_with_ttl("k", "v2".to_string(), Duration::from_secs(10))
            .unwrap();
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get("k").unwrap(), Some("v2".to_string()));
        assert_eq!(
            cache.ttl_remaining("k").unwrap(),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_delete() {
        let (cache, _) = manual_cache();

        assert!(!cache.delete("k").unwrap());

        cache.set("k", "v".to_string()).unwrap();
        assert!(cache.delete("k").unwrap());
        assert!(!cache.delete("k").unwrap());
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_delete_expired_entry_reports_absent() {
        let (cache, clock) = manual_cache();

        cache
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(1))
            .unwrap();
        clock.advance(Duration::from_secs(2));

        assert!(!cache.delete("k").unwrap());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evicted_total, 1);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let (cache, _) = manual_cache();

        cache.set("a", "1".to_string()).unwrap();
        cache.set("b", "2".to_string()).unwrap();
        let _ = cache.get("a").unwrap();
        let _ = cache.get("missing").unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.get("a").unwrap(), None);
        assert_eq!(cache.get("b").unwrap(), None);

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.inserted_total, 2);
        assert_eq!(stats.hit_total, 1);
        assert_eq!(stats.miss_total, 3);
    }

    #[test]
    fn test_contains_does_not_count() {
        let (cache, _) = manual_cache();

        cache.set("k", "v".to_string()).unwrap();
        assert!(cache.contains("k").unwrap());
        assert!(!cache.contains("other").unwrap());

        let stats = cache.stats();
        assert_eq!(stats.hit_total, 0);
        assert_eq!(stats.miss_total, 0);
    }

    #[test]
    fn test_stats_does_not_evict() {
        let (cache, clock) = manual_cache();

        cache
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(1))
            .unwrap();
        clock.advance(Duration::from_secs(5));

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.evicted_total, 0);
        assert_eq!(cache.stats(), stats);
    }

    #[test]
    fn test_manual_sweep() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig::new()
            .with_cleanup_task(false)
            .with_sweep_batch_size(2);
        let cache: TtlCache<u32> = TtlCache::with_clock(config, clock.clone()).unwrap();

        for i in 0..5 {
            cache
                .set_with_ttl(&format!("short-{i}"), i, Duration::from_secs(1))
                .unwrap();
        }
        cache
            .set_with_ttl("long", 99, Duration::from_secs(60))
            .unwrap();

        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.sweep().unwrap(), 5);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long").unwrap(), Some(99));
        assert_eq!(cache.stats().evicted_total, 5);
    }

    #[test]
    fn test_sweep_skips_refreshed_keys() {
        let (cache, clock) = manual_cache();

        cache
            .set_with_ttl("k", "old".to_string(), Duration::from_secs(1))
            .unwrap();
        clock.advance(Duration::from_secs(2));

        let expired = cache.shared.collect_expired();
        assert_eq!(expired, vec!["k".to_string()]);

        // Re-set between the two sweep phases.
        cache.set("k", "fresh".to_string()).unwrap();

        assert_eq!(cache.shared.remove_expired(&expired), 0);
        assert_eq!(cache.get("k").unwrap(), Some("fresh".to_string()));
    }

    #[test]
    fn test_destroy_closes_cache() {
        let (cache, _) = manual_cache();
        cache.set("k", "v".to_string()).unwrap();

        cache.destroy();
        cache.destroy();

        assert!(cache.is_closed());
        assert_eq!(cache.get("k"), Err(Error::CacheClosed));
        assert_eq!(cache.set("k", "v".to_string()), Err(Error::CacheClosed));
        assert_eq!(cache.delete("k"), Err(Error::CacheClosed));
        assert_eq!(cache.clear(), Err(Error::CacheClosed));
        assert_eq!(cache.sweep(), Err(Error::CacheClosed));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_destroy_is_shared_by_clones() {
        let (cache, _) = manual_cache();
        let other = cache.clone();

        other.destroy();

        assert_eq!(cache.get("k"), Err(Error::CacheClosed));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CacheConfig::new().with_cleanup_interval(Duration::ZERO);
        let result: Result<TtlCache<String>> = TtlCache::new(config);
        assert!(matches!(result, Err(Error::InvalidDuration(_))));
    }

    #[test]
    fn test_out_of_range_ttl_rejected() {
        let (cache, _) = manual_cache();

        let result = cache.set_with_ttl("k", "v".to_string(), Duration::MAX);
        assert!(matches!(result, Err(Error::InvalidDuration(_))));
    }

    #[tokio::test]
    async fn test_dropping_last_handle_frees_storage() {
        let config = CacheConfig::new().with_cleanup_interval(Duration::from_millis(10));
        let cache: TtlCache<String> = TtlCache::new(config).unwrap();
        cache.set("k", "v".to_string()).unwrap();
        assert!(cache.is_sweeping());

        let storage = Arc::downgrade(&cache.shared);
        let other = cache.clone();

        // Let the sweep tick a few times while handles are alive.
        tokio::time::sleep(Duration::from_millis(35)).await;
        drop(cache);
        assert!(storage.upgrade().is_some());

        drop(other);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(storage.upgrade().is_none());
    }

    #[test]
    fn test_sweep_stops_with_its_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let cache: TtlCache<String> = {
            let _guard = runtime.enter();
            TtlCache::new(CacheConfig::new()).unwrap()
        };
        assert!(cache.is_sweeping());

        drop(runtime);

        assert!(!cache.is_sweeping());
        assert!(!cache.is_closed());
        cache.set("k", "v".to_string()).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_no_runtime_means_no_sweep() {
        let cache: TtlCache<String> = TtlCache::new(CacheConfig::new()).unwrap();
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_destroy_stops_sweeping() {
        let cache: TtlCache<String> = TtlCache::new(CacheConfig::new()).unwrap();
        assert!(cache.is_sweeping());

        cache.destroy();
        assert!(!cache.is_sweeping());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hit_total: 3,
            miss_total: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), Some(0.75));
        assert_eq!(CacheStats::default().hit_rate(), None);
    }
}
