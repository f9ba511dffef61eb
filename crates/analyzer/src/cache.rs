//! Time- and capacity-bounded cache for raw file bytes.
//!
//! Readers share the lock; writers take it exclusively only while
//! inserting. Load errors are surfaced verbatim and never cached.

use rustc_hash::FxHashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 100;

type Loader<V> = Box<dyn Fn(&str) -> io::Result<V> + Send + Sync>;

struct CacheEntry<V> {
    created: Instant,
    value: Arc<V>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() > ttl
    }
}

/// Generic bounded cache: lookup is the only load path, a miss runs the
/// loader and populates.
pub struct LocalCache<V> {
    loader: Loader<V>,
    ttl: Duration,
    capacity: usize,
    values: RwLock<FxHashMap<String, CacheEntry<V>>>,
}

impl<V> LocalCache<V> {
    pub fn new<F>(ttl: Duration, capacity: usize, loader: F) -> Self
    where
        F: Fn(&str) -> io::Result<V> + Send + Sync + 'static,
    {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        Self {
            loader: Box::new(loader),
            ttl,
            capacity,
            values: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn get(&self, key: &str) -> io::Result<Arc<V>> {
        {
            let values = self.values.read().unwrap();
            if let Some(entry) = values.get(key) {
                if !entry.is_expired(self.ttl) {
                    return Ok(Arc::clone(&entry.value));
                }
            }
        }

        // Miss or expired: load without holding the lock.
        let value = Arc::new((self.loader)(key)?);
        let mut values = self.values.write().unwrap();
        values.insert(
            key.to_string(),
            CacheEntry {
                created: Instant::now(),
                value: Arc::clone(&value),
            },
        );
        Self::evict_locked(&mut values, self.ttl, self.capacity);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity overflow drops expired entries first, then evicts the
    /// oldest by insertion time until the cache is half full.
    fn evict_locked(values: &mut FxHashMap<String, CacheEntry<V>>, ttl: Duration, capacity: usize) {
        if values.len() <= capacity {
            return;
        }

        let expired: Vec<String> = values
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            values.remove(&key);
        }
        if values.len() <= capacity {
            return;
        }

        let mut by_age: Vec<(Instant, String)> = values
            .iter()
            .map(|(key, entry)| (entry.created, key.clone()))
            .collect();
        by_age.sort_by_key(|(created, _)| *created);
        let target = capacity / 2;
        for (_, key) in by_age {
            if values.len() <= target {
                break;
            }
            values.remove(&key);
        }
    }
}

/// Cache of absolute path → raw file bytes feeding source slicing.
pub struct FileContentCache {
    cache: LocalCache<Vec<u8>>,
}

impl Default for FileContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl FileContentCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            cache: LocalCache::new(ttl, capacity, |path| std::fs::read(path)),
        }
    }

    pub fn read(&self, path: &Path) -> io::Result<Arc<Vec<u8>>> {
        let key = path.to_string_lossy();
        self.cache.get(key.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn get_loads_once_and_caches() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = LocalCache::new(Duration::from_secs(60), 10, move |key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(key.len())
        });

        assert_eq!(*cache.get("abc").unwrap(), 3);
        assert_eq!(*cache.get("abc").unwrap(), 3);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn errors_are_surfaced_and_not_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache: LocalCache<usize> = LocalCache::new(Duration::from_secs(60), 10, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
        });

        assert!(cache.get("x").is_err());
        assert!(cache.get("x").is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_overflow_evicts_to_half() {
        let cache = LocalCache::new(Duration::from_secs(60), 4, |key: &str| Ok(key.len()));
        for key in ["a", "b", "c", "d", "e"] {
            cache.get(key).unwrap();
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_never_exceeds_capacity_after_get() {
        let cache = LocalCache::new(Duration::from_secs(60), 8, |key: &str| Ok(key.len()));
        for index in 0..100 {
            cache.get(&format!("key-{index}")).unwrap();
            assert!(cache.len() <= 8);
        }
    }

    #[test]
    fn expired_entries_reload() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let cache = LocalCache::new(Duration::from_nanos(1), 10, move |key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(key.len())
        });

        cache.get("a").unwrap();
        std::thread::sleep(Duration::from_millis(2));
        cache.get("a").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn file_cache_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, b"package main\n").unwrap();

        let cache = FileContentCache::default();
        let content = cache.read(&path).unwrap();
        assert_eq!(content.as_slice(), b"package main\n");
        assert!(cache.read(&dir.path().join("missing.go")).is_err());
    }
}
