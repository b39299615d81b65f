//! Explicitly scoped lookup cache for identifier normalization.
//!
//! Hosts that re-render often can keep one [`KeyCache`] alive and pass it to
//! each render. It only memoizes [`normalize_identifier`], so a cached and an
//! uncached render produce the same scene.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geo::{Geography, normalize_identifier};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Entries kept before the oldest is evicted
    pub capacity: usize,
    /// Seconds an entry stays valid
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            ttl_secs: 600,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    inserted: Instant,
}

/// Bounded, expiring memo of normalized identifiers
#[derive(Debug, Clone)]
pub struct KeyCache {
    capacity: usize,
    ttl: Duration,
    entries: IndexMap<(Geography, String), Entry>,
    hits: u64,
    misses: u64,
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl KeyCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            capacity: config.capacity.max(1),
            ttl: Duration::from_secs(config.ttl_secs),
            entries: IndexMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Normalize through the cache
    pub fn normalize(&mut self, raw: &str, geography: Geography) -> String {
        self.normalize_at(raw, geography, Instant::now())
    }

    /// [`normalize`](Self::normalize) with an explicit clock
    pub fn normalize_at(&mut self, raw: &str, geography: Geography, now: Instant) -> String {
        let lookup = (geography, raw.to_string());
        if let Some(entry) = self.entries.get(&lookup) {
            if now.saturating_duration_since(entry.inserted) < self.ttl {
                self.hits += 1;
                return entry.key.clone();
            }
            self.entries.shift_remove(&lookup);
        }
        self.misses += 1;
        let key = normalize_identifier(raw, geography);
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(
            lookup,
            Entry {
                key: key.clone(),
                inserted: now,
            },
        );
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since construction
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memoizes_and_matches_uncached() {
        let mut cache = KeyCache::default();
        let a = cache.normalize("California", Geography::UsaStates);
        let b = cache.normalize("California", Geography::UsaStates);
        assert_eq!(a, "CA");
        assert_eq!(a, b);
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(a, normalize_identifier("California", Geography::UsaStates));
    }

    #[test]
    fn geography_is_part_of_the_key() {
        let mut cache = KeyCache::default();
        assert_eq!(cache.normalize("Ontario", Geography::CanadaProvinces), "ON");
        assert_eq!(cache.normalize("Ontario", Geography::World), "Ontario");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut cache = KeyCache::new(CacheConfig {
            capacity: 2,
            ttl_secs: 60,
        });
        let g = Geography::UsaStates;
        cache.normalize("ca", g);
        cache.normalize("tx", g);
        cache.normalize("ny", g);
        assert_eq!(cache.len(), 2);
        cache.normalize("tx", g);
        assert_eq!(cache.stats(), (1, 3));
        cache.normalize("ca", g);
        assert_eq!(cache.stats(), (1, 4));
    }

    #[test]
    fn entries_expire() {
        let mut cache = KeyCache::new(CacheConfig {
            capacity: 8,
            ttl_secs: 10,
        });
        let t0 = Instant::now();
        let g = Geography::UsaStates;
        cache.normalize_at("ca", g, t0);
        cache.normalize_at("ca", g, t0 + Duration::from_secs(5));
        assert_eq!(cache.stats(), (1, 1));
        cache.normalize_at("ca", g, t0 + Duration::from_secs(11));
        assert_eq!(cache.stats(), (1, 2));
        assert_eq!(cache.len(), 1);
    }
}
