//! Compiled-schema cache shared across concurrent checks
//!
//! Entries are keyed by the full schema text, so two bodies that declare the
//! same schema share one compiled form. All access goes through an `RwLock`;
//! compilation happens outside the lock and the first insert for a key wins.
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Configuration for cache behavior
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum cache size (number of compiled schemas)
    pub max_entries: usize,
    /// Whether to enable cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Configuration holding at most `max_entries` schemas; zero disables the cache
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            max_entries,
            enabled: max_entries > 0,
        }
    }
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<String, Arc<T>>,
    access_order: Vec<String>, // For LRU eviction
}

/// Thread-safe LRU cache of compiled schemas
#[derive(Debug)]
pub struct SchemaCache<T> {
    state: RwLock<CacheState<T>>,
    config: CacheConfig,
}

impl<T> SchemaCache<T> {
    /// Create a new schema cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new schema cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                access_order: Vec::new(),
            }),
            config,
        }
    }

    /// Return the compiled form of `schema`, compiling it with `compile` on a miss.
    ///
    /// Compilation failures are returned to the caller and never cached.
    pub fn get_or_try_insert_with<E, F>(&self, schema: &str, compile: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.config.enabled {
            return compile().map(Arc::new);
        }

        if let Some(hit) = self.get(schema) {
            return Ok(hit);
        }

        let compiled = Arc::new(compile()?);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.entries.get(schema).cloned() {
            return Ok(existing);
        }
        if state.entries.len() >= self.config.max_entries {
            state.evict_lru();
        }
        state.entries.insert(schema.to_string(), Arc::clone(&compiled));
        state.access_order.push(schema.to_string());
        Ok(compiled)
    }

    /// Get a cached compiled schema if present
    pub fn get(&self, schema: &str) -> Option<Arc<T>> {
        if !self.config.enabled {
            return None;
        }
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let hit = state.entries.get(schema).cloned();
        if hit.is_some() {
            state.touch(schema);
        }
        hit
    }

    /// Check if cache contains a schema
    pub fn contains(&self, schema: &str) -> bool {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.entries.contains_key(schema)
    }

    /// Number of cached schemas
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.entries.clear();
        state.access_order.clear();
    }
}

impl<T> CacheState<T> {
    fn evict_lru(&mut self) {
        if !self.access_order.is_empty() {
            let oldest = self.access_order.remove(0);
            self.entries.remove(&oldest);
        }
    }

    fn touch(&mut self, key: &str) {
        self.access_order.retain(|k| k != key);
        self.access_order.push(key.to_string());
    }
}

impl<T> Default for SchemaCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_compiles_once_per_schema() {
        let cache: SchemaCache<String> = SchemaCache::new();
        let calls = Cell::new(0);
        let compile = || -> Result<String, ()> {
            calls.set(calls.get() + 1);
            Ok("compiled".to_string())
        };

        let first = cache.get_or_try_insert_with("{}", compile).unwrap();
        let second = cache.get_or_try_insert_with("{}", compile).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains("{}"));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache: SchemaCache<String> = SchemaCache::new();
        let result: Result<Arc<String>, &str> = cache.get_or_try_insert_with("bad", || Err("nope"));
        assert_eq!(result.unwrap_err(), "nope");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_lru_eviction() {
        let cache: SchemaCache<u32> = SchemaCache::with_config(CacheConfig::with_capacity(2));
        let ok = |n: u32| move || -> Result<u32, ()> { Ok(n) };

        cache.get_or_try_insert_with("a", ok(1)).unwrap();
        cache.get_or_try_insert_with("b", ok(2)).unwrap();
        // Touch "a" so "b" becomes the oldest
        assert!(cache.get("a").is_some());
        cache.get_or_try_insert_with("c", ok(3)).unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disabled_cache() {
        let cache: SchemaCache<u32> = SchemaCache::with_config(CacheConfig::with_capacity(0));
        let value = cache.get_or_try_insert_with("a", || -> Result<u32, ()> { Ok(7) }).unwrap();
        assert_eq!(*value, 7);
        assert!(!cache.contains("a"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache: Arc<SchemaCache<usize>> = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    *cache
                        .get_or_try_insert_with("shared", || -> Result<usize, ()> { Ok(11) })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 11);
        }
        assert_eq!(cache.len(), 1);
    }
}
