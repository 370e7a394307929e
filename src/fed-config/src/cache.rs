//! The configuration cache (`spec.md §4.1`): bounded, per-entry-TTL,
//! FIFO-by-creation-time eviction.
//!
//! Producer and consumer snapshots are kept in independent shards sharing
//! one capacity/TTL policy, so a burst of producer refreshes cannot evict
//! consumer entries (`SPEC_FULL.md §4.1`). Each shard is a single critical
//! section (`parking_lot::Mutex`); that section is short (map lookups and
//! `VecDeque` pushes/pops), so in practice readers rarely contend, but
//! unlike a true RwLock a reader can still perform the lazy
//! expired-entry eviction the contract requires on `get`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use fed_types::ConfigSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Producer,
    Consumer,
}

struct Entry {
    snapshot: Arc<ConfigSnapshot>,
    expires_at: Instant,
}

#[derive(Default)]
struct Shard {
    entries: HashMap<String, Entry>,
    /// Insertion order, oldest first, for FIFO eviction.
    order: VecDeque<String>,
}

impl Shard {
    fn evict_expired(&mut self, key: &str, now: Instant) -> bool {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at <= now {
                self.entries.remove(key);
                self.order.retain(|k| k != key);
                return true;
            }
        }
        false
    }

    fn insert(&mut self, key: String, snapshot: Arc<ConfigSnapshot>, ttl: Duration, capacity: usize) -> bool {
        let evicted = if !self.entries.contains_key(&key) && self.entries.len() >= capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                true
            } else {
                false
            }
        } else {
            // Replacing an existing key does not change FIFO order.
            self.order.retain(|k| k != &key);
            false
        };
        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            Entry {
                snapshot,
                expires_at: Instant::now() + ttl,
            },
        );
        evicted
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Holds the most recent producer/consumer policy snapshots keyed by client
/// id, with bounded size and per-entry TTL (`spec.md §4.1`).
pub struct ConfigCache {
    capacity: usize,
    default_ttl: Duration,
    producer: Mutex<Shard>,
    consumer: Mutex<Shard>,
    counters: Counters,
}

impl ConfigCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            capacity,
            default_ttl,
            producer: Mutex::new(Shard::default()),
            consumer: Mutex::new(Shard::default()),
            counters: Counters::default(),
        }
    }

    fn shard(&self, kind: CacheKind) -> &Mutex<Shard> {
        match kind {
            CacheKind::Producer => &self.producer,
            CacheKind::Consumer => &self.consumer,
        }
    }

    /// Returns a non-expired snapshot, or `None`. Expired entries are
    /// removed as a side effect.
    pub fn get(&self, kind: CacheKind, key: &str) -> Option<Arc<ConfigSnapshot>> {
        let mut shard = self.shard(kind).lock();
        let now = Instant::now();
        if shard.evict_expired(key, now) {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        match shard.entries.get(key) {
            Some(entry) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.snapshot))
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Installs a snapshot with expiry `now + default_ttl`. If the shard is
    /// at capacity, the oldest-inserted entry is evicted.
    pub fn put(&self, kind: CacheKind, key: impl Into<String>, snapshot: ConfigSnapshot) {
        let mut shard = self.shard(kind).lock();
        let evicted = shard.insert(key.into(), Arc::new(snapshot), self.default_ttl, self.capacity);
        if evicted {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn clear(&self, kind: CacheKind) {
        let mut shard = self.shard(kind).lock();
        *shard = Shard::default();
    }

    pub fn clear_all(&self) {
        self.clear(CacheKind::Producer);
        self.clear(CacheKind::Consumer);
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.producer.lock().entries.len() + self.consumer.lock().entries.len();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fed_types::ConfigKind;

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot::parse(
            ConfigKind::Producer,
            br#"{"clientId":"c","producers":[]}"#,
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn miss_then_hit() {
        let cache = ConfigCache::new(10, Duration::from_secs(60));
        assert!(cache.get(CacheKind::Producer, "k1").is_none());
        cache.put(CacheKind::Producer, "k1", snapshot());
        assert!(cache.get(CacheKind::Producer, "k1").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn fifo_eviction_at_capacity() {
        let cache = ConfigCache::new(1, Duration::from_secs(60));
        cache.put(CacheKind::Producer, "k1", snapshot());
        cache.put(CacheKind::Producer, "k2", snapshot());
        // Capacity 1, two puts => second get of first key is a miss (spec.md §8).
        assert!(cache.get(CacheKind::Producer, "k1").is_none());
        assert!(cache.get(CacheKind::Producer, "k2").is_some());
    }

    #[test]
    fn fifo_survivors_are_latest_capacity_keys() {
        let cache = ConfigCache::new(2, Duration::from_secs(60));
        for k in ["k1", "k2", "k3", "k4"] {
            cache.put(CacheKind::Producer, k, snapshot());
        }
        assert!(cache.get(CacheKind::Producer, "k1").is_none());
        assert!(cache.get(CacheKind::Producer, "k2").is_none());
        assert!(cache.get(CacheKind::Producer, "k3").is_some());
        assert!(cache.get(CacheKind::Producer, "k4").is_some());
    }

    #[test]
    fn producer_and_consumer_shards_are_independent() {
        let cache = ConfigCache::new(1, Duration::from_secs(60));
        cache.put(CacheKind::Producer, "k1", snapshot());
        cache.put(CacheKind::Consumer, "k1", snapshot());
        assert!(cache.get(CacheKind::Producer, "k1").is_some());
        assert!(cache.get(CacheKind::Consumer, "k1").is_some());
    }

    #[test]
    fn expired_entries_are_removed_on_read() {
        let cache = ConfigCache::new(10, Duration::from_millis(1));
        cache.put(CacheKind::Producer, "k1", snapshot());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(CacheKind::Producer, "k1").is_none());
        assert_eq!(cache.stats().evictions, 1);
    }
}
