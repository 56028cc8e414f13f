//! Bounded TTL cache for selection verdicts and context analyses.
//!
//! Grounded on `original_source/0.2/__main__.py`'s `QueryCache`: queries are
//! normalized (lowercased, whitespace-collapsed) before lookup, entries
//! expire after a TTL, and eviction under pressure drops the single oldest
//! entry by insertion time. The pack carries no `lru`/`indexmap` crate, so
//! this mirrors the reference's own approach — a linear scan for the oldest
//! timestamp — rather than reaching for a dependency the stack doesn't have.
//! [`dashmap`] (already pulled in for the `dispatcher` feature) supplies the
//! concurrent map so the cache can be shared behind an `Arc` without a mutex.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

/// A concurrent, TTL-bounded cache keyed by normalized query text.
pub struct VerdictCache<T: Clone> {
    entries: DashMap<String, Entry<T>>,
    max_size: usize,
    ttl: Duration,
}

impl<T: Clone> VerdictCache<T> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_size,
            ttl,
        }
    }

    /// Lowercase and collapse whitespace, exactly as `QueryCache._normalize_query` does.
    pub fn normalize(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let key = Self::normalize(key);
        let hit = self.entries.get(&key).and_then(|entry| {
            if entry.inserted_at.elapsed() <= self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        });
        if hit.is_none() {
            // Either missing or expired — drop a stale entry eagerly.
            self.entries.remove(&key);
        }
        hit
    }

    pub fn set(&self, key: &str, value: T) {
        let key = Self::normalize(key);
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_before_lookup() {
        let cache = VerdictCache::new(10, Duration::from_secs(60));
        cache.set("  What IS  the Price?  ", 42);
        assert_eq!(cache.get("what is the price?"), Some(42));
    }

    #[test]
    fn expired_entries_miss() {
        let cache: VerdictCache<i32> = VerdictCache::new(10, Duration::from_millis(0));
        cache.set("q", 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("q"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let cache = VerdictCache::new(2, Duration::from_secs(60));
        cache.set("first", 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("second", 2);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("third", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(2));
        assert_eq!(cache.get("third"), Some(3));
    }
}
