//! Parsed template cache.
//!
//! Templates are keyed by their full source text. Parsing is not serialized:
//! two threads missing on the same template may both parse it, and the later
//! insert wins. Both results are equal, so callers can't tell.

use crate::ast::Template;
use crate::error::Result;
use crate::parser::parse;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::debug;

struct CachedTemplate {
    template: Arc<Template>,
    /// Tick of the last access, for least-recently-used eviction.
    last_used: AtomicU64,
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(AtomicOrdering::Relaxed)
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Bounded map from template text to parsed template.
pub struct TemplateCache {
    entries: RwLock<HashMap<String, CachedTemplate>>,
    capacity: usize,
    clock: AtomicU64,
    stats: CacheStats,
}

impl TemplateCache {
    /// Create a cache holding at most `capacity` templates. A capacity of
    /// zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
            clock: AtomicU64::new(0),
            stats: CacheStats::default(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Cached template for `source`, without parsing.
    pub fn get(&self, source: &str) -> Option<Arc<Template>> {
        let guard = self.entries.read();
        match guard.get(source) {
            Some(cached) => {
                cached.last_used.store(self.tick(), AtomicOrdering::Relaxed);
                self.stats.hits.fetch_add(1, AtomicOrdering::Relaxed);
                Some(Arc::clone(&cached.template))
            }
            None => {
                self.stats.misses.fetch_add(1, AtomicOrdering::Relaxed);
                None
            }
        }
    }

    /// Cached template for `source`, parsing and caching it on a miss.
    /// Parse errors are not cached.
    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Template>> {
        if let Some(template) = self.get(source) {
            return Ok(template);
        }
        let template = Arc::new(parse(source)?);
        self.insert(source, Arc::clone(&template));
        Ok(template)
    }

    /// Store a parsed template, evicting the least recently used entry when
    /// full.
    pub fn insert(&self, source: &str, template: Arc<Template>) {
        if self.capacity == 0 {
            return;
        }
        let mut guard = self.entries.write();
        if guard.len() >= self.capacity && !guard.contains_key(source) {
            self.evict_lru(&mut guard);
        }
        guard.insert(
            source.to_string(),
            CachedTemplate {
                template,
                last_used: AtomicU64::new(self.tick()),
            },
        );
    }

    fn evict_lru(&self, entries: &mut HashMap<String, CachedTemplate>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, v)| v.last_used.load(AtomicOrdering::Relaxed))
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest {
            entries.remove(&key);
            self.stats.evictions.fetch_add(1, AtomicOrdering::Relaxed);
            debug!(evicted_len = key.len(), "Evicted cached template");
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the current number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_hit_after_miss() {
        let cache = TemplateCache::new(4);
        let first = cache.get_or_parse("SELECT #bind($a)").unwrap();
        let second = cache.get_or_parse("SELECT #bind($a)").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = TemplateCache::new(2);
        cache.get_or_parse("A").unwrap();
        cache.get_or_parse("B").unwrap();
        // touch A so B becomes the oldest
        cache.get_or_parse("A").unwrap();
        cache.get_or_parse("C").unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions(), 1);
        assert!(cache.get("A").is_some());
        assert!(cache.get("B").is_none());
        assert!(cache.get("C").is_some());
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let cache = TemplateCache::new(2);
        assert!(cache.get_or_parse("#nope()").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = TemplateCache::new(0);
        cache.get_or_parse("SELECT 1").unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_concurrent_population() {
        let cache = TemplateCache::new(8);
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for i in 0..16 {
                        let text = format!("SELECT {} WHERE A = #bind($a)", i % 4);
                        cache.get_or_parse(&text).unwrap();
                    }
                });
            }
        });
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.stats().hits() + cache.stats().misses(), 64);
    }
}
