//! Parsed-asset cache with least-recently-used eviction
//!
//! Entries are keyed by source URI. Every lookup or insert advances a
//! logical clock and stamps the touched entry, so an entry's age is the
//! number of cache accesses since it was last used and drops back to zero on
//! each hit. Once an insert pushes the cache past its capacity, the entry
//! with the greatest age is evicted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Cache entry with asset and metadata
struct CacheEntry<T> {
    /// Cached asset
    asset: Arc<T>,
    /// Logical time of the last access
    last_access: u64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries stored (including replacements)
    pub inserts: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
}

/// Bounded URI → asset cache
pub struct AssetCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Recency index: last access → uri; the first key is the oldest entry
    recency: BTreeMap<u64, String>,
    clock: u64,
    capacity: usize,
    stats: CacheStats,
}

impl<T> AssetCache<T> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    /// Look up an asset, resetting its age on a hit
    pub fn get(&mut self, uri: &str) -> Option<Arc<T>> {
        let now = self.tick();
        let Some(entry) = self.entries.get_mut(uri) else {
            self.stats.misses += 1;
            return None;
        };
        self.recency.remove(&entry.last_access);
        entry.last_access = now;
        self.recency.insert(now, uri.to_string());
        self.stats.hits += 1;
        Some(Arc::clone(&entry.asset))
    }

    /// Look up an asset without touching its age or the counters
    pub fn peek(&self, uri: &str) -> Option<&Arc<T>> {
        self.entries.get(uri).map(|entry| &entry.asset)
    }

    /// Store an asset with age zero, returning the URIs evicted to make room
    pub fn insert(&mut self, uri: impl Into<String>, asset: Arc<T>) -> Vec<String> {
        let uri = uri.into();
        let now = self.tick();
        if let Some(old) = self.entries.insert(
            uri.clone(),
            CacheEntry {
                asset,
                last_access: now,
            },
        ) {
            self.recency.remove(&old.last_access);
        }
        self.recency.insert(now, uri);
        self.stats.inserts += 1;

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
            log::debug!("Evicted asset {} from cache", oldest);
            evicted.push(oldest);
        }
        evicted
    }

    /// Remove one entry
    pub fn remove(&mut self, uri: &str) -> Option<Arc<T>> {
        let entry = self.entries.remove(uri)?;
        self.recency.remove(&entry.last_access);
        Some(entry.asset)
    }

    /// Number of cache accesses since the entry was last used
    pub fn age(&self, uri: &str) -> Option<u64> {
        self.entries
            .get(uri)
            .map(|entry| self.clock - entry.last_access)
    }

    /// Check if an asset is cached
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    /// Get the number of cached assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters since construction
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Clear all cached assets
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
